use super::{Module, ModuleResult, is_ssh};
use crate::context::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The machine name, up to the first dot. Hidden unless over SSH or
/// `showAlways` is set.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostnameModule {
    show_always: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct HostnameData {
    hostname: String,
    #[serde(rename = "IsSSH")]
    is_ssh: bool,
    show: bool,
}

impl Module for HostnameModule {
    fn execute(&self, context: &Arc<Context>) -> ModuleResult {
        let is_ssh = is_ssh(context);
        let show = is_ssh || self.show_always;
        let hostname = context
            .globals
            .hostname
            .split('.')
            .next()
            .unwrap_or_default()
            .to_string();

        ModuleResult::with_data(
            if show { hostname.as_str() } else { "" },
            &HostnameData {
                hostname: hostname.clone(),
                is_ssh,
                show,
            },
        )
    }
}
