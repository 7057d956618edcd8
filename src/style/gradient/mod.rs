//! CSS-style linear gradients laid out along a line of text.
//!
//! A gradient is a list of stops. Offsets can be absolute (`px`, one pixel
//! per terminal column) or relative (`%` of the text's print width), and
//! either may be left out and filled in by [`LinearGradient::normalize`].
//! Offsets that straddle an absolute/relative boundary can only be resolved
//! once the text's width is known, so that happens lazily in
//! [`LinearGradient::color_at`].

mod stops;

pub use stops::{StopsError, parse_stops};

use crate::style::color::{Rgba, lerp};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Offset {
    /// Columns from the start of the text.
    Absolute(f64),
    /// Fraction of the text's print width.
    Relative(f64),
}

impl Offset {
    fn value(&self) -> f64 {
        match self {
            Offset::Absolute(v) | Offset::Relative(v) => *v,
        }
    }

    fn is_absolute(&self) -> bool {
        matches!(self, Offset::Absolute(_))
    }

    fn resolve(&self, length: usize) -> f64 {
        match self {
            Offset::Absolute(v) => *v,
            Offset::Relative(v) => *v * length as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub color: Option<Rgba>,
    pub offset: Option<Offset>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    stops: Vec<Stop>,
}

impl LinearGradient {
    /// Parse and normalize a stop list, e.g. `#f00, 30%, #00f 10px`.
    pub fn parse(
        stops: &str,
        colors: Option<&HashMap<String, String>>,
    ) -> Result<Self, StopsError> {
        let stops = parse_stops(colors, stops)?;
        if stops.is_empty() {
            return Err(StopsError::Syntax {
                message: "linear-gradient needs at least one color stop".to_string(),
                position: 1,
            });
        }
        Ok(Self::from_stops(stops))
    }

    /// Build from raw stops. `stops` must be non-empty.
    pub fn from_stops(stops: Vec<Stop>) -> Self {
        let mut gradient = LinearGradient { stops };
        gradient.normalize();
        gradient
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Fill in missing first/last offsets and colours, interpolate the
    /// offsets that can be interpolated, and interpolate missing colours.
    pub fn normalize(&mut self) {
        let stops = &mut self.stops;
        let Some(last) = stops.len().checked_sub(1) else {
            return;
        };

        if stops[0].offset.is_none() {
            stops[0].offset = Some(Offset::Relative(0.0));
        }
        if stops[last].offset.is_none() {
            stops[last].offset = Some(Offset::Relative(1.0));
        }
        if stops[0].color.is_none() {
            stops[0].color = Some(Rgba::BLACK);
        }
        if stops[last].color.is_none() {
            stops[last].color = Some(Rgba::WHITE);
        }

        interpolate_offsets(stops);
        interpolate_colors(stops);
    }

    fn color(&self, index: usize) -> Rgba {
        self.stops[index].color.unwrap_or(Rgba::BLACK)
    }

    /// Where stop `index` falls for a text `length` columns wide.
    ///
    /// A run of stops without offsets is spread evenly between the nearest
    /// resolved stops on either side.
    fn stop_offset(&self, index: usize, length: usize) -> f64 {
        let stops = &self.stops;
        if index >= stops.len() {
            return length as f64;
        }
        let resolved = |i: usize| match stops[i].offset {
            Some(offset) => Some(offset.resolve(length)),
            None if i == 0 => Some(0.0),
            None if i == stops.len() - 1 => Some(length as f64),
            None => None,
        };
        if let Some(offset) = resolved(index) {
            return offset;
        }

        let (prev_index, prev) = (0..index)
            .rev()
            .find_map(|i| resolved(i).map(|offset| (i, offset)))
            .unwrap_or((0, 0.0));
        let (next_index, next) = (index + 1..stops.len())
            .find_map(|i| resolved(i).map(|offset| (i, offset)))
            .unwrap_or((stops.len() - 1, length as f64));

        if next <= prev {
            return prev;
        }
        let step = (next - prev) / (next_index - prev_index) as f64;
        prev + step * (index - prev_index) as f64
    }

    /// Colour at an arbitrary position along a `length`-column line.
    pub fn color_at_position(&self, length: usize, position: f64) -> Rgba {
        Colorizer::new(self, length).color_at(position)
    }

    /// Colour at column `index`. `-1` and `length + 1` give the colours just
    /// before and after the text.
    pub fn color_at(&self, length: usize, index: i64) -> Rgba {
        self.color_at_position(length, index as f64)
    }

    /// One colour per column, sampled at the centre of each column.
    pub fn colors(&self, length: usize) -> Vec<Rgba> {
        let mut colorizer = Colorizer::new(self, length);
        (0..length)
            .map(|i| colorizer.color_at(i as f64 + 0.5))
            .collect()
    }
}

fn interpolate_offsets(stops: &mut [Stop]) {
    let mut last_defined = 0;
    for i in 1..stops.len() {
        let Some(this) = stops[i].offset else {
            continue;
        };
        if last_defined != i - 1 {
            let Some(prev) = stops[last_defined].offset else {
                last_defined = i;
                continue;
            };
            // A zero offset is the same whether absolute or relative.
            let prev_absolute = if prev.value() == 0.0 {
                this.is_absolute()
            } else {
                prev.is_absolute()
            };

            if prev_absolute == this.is_absolute() {
                let count = i - last_defined + 1;
                let delta = (this.value() - prev.value()) / (count - 1) as f64;
                for k in 0..count {
                    let value = prev.value() + k as f64 * delta;
                    stops[last_defined + k].offset = Some(if this.is_absolute() {
                        Offset::Absolute(value)
                    } else {
                        Offset::Relative(value)
                    });
                }
            }
        }
        last_defined = i;
    }
}

fn interpolate_colors(stops: &mut [Stop]) {
    let mut last_defined = 0;
    for i in 1..stops.len() {
        let Some(to) = stops[i].color else {
            continue;
        };
        if last_defined != i - 1
            && let Some(from) = stops[last_defined].color
        {
            let missing = (i - last_defined - 1) as f64;
            for m in (last_defined + 1)..i {
                let s = (m - last_defined) as f64 / (missing + 1.0);
                stops[m].color = Some(lerp(from, to, s));
            }
        }
        last_defined = i;
    }
}

/// Walks the stops left to right. Positions are usually requested in
/// increasing order, so the current segment is kept between calls.
struct Colorizer<'a> {
    gradient: &'a LinearGradient,
    length: usize,
    current: usize,
    current_offset: f64,
    next_offset: f64,
    last_position: Option<f64>,
}

impl<'a> Colorizer<'a> {
    fn new(gradient: &'a LinearGradient, length: usize) -> Self {
        Colorizer {
            gradient,
            length,
            current: 0,
            current_offset: 0.0,
            next_offset: 0.0,
            last_position: None,
        }
    }

    fn reset(&mut self) {
        self.current = 0;
        self.current_offset = self.gradient.stop_offset(0, self.length);
        self.next_offset = self.gradient.stop_offset(1, self.length);
    }

    fn color_at(&mut self, position: f64) -> Rgba {
        let count = self.gradient.stops.len();
        if self.last_position.is_none_or(|last| position < last) {
            self.reset();
        }
        self.last_position = Some(position);

        while self.next_offset <= position && self.current < count - 1 {
            self.current += 1;
            self.current_offset = self.next_offset;
            self.next_offset = self.gradient.stop_offset(self.current + 1, self.length);
        }

        if self.current == 0 && position < self.current_offset {
            self.gradient.color(0)
        } else if self.current >= count - 1 {
            self.gradient.color(self.current)
        } else {
            let span = self.next_offset - self.current_offset;
            if span <= 0.0 {
                return self.gradient.color(self.current + 1);
            }
            lerp(
                self.gradient.color(self.current),
                self.gradient.color(self.current + 1),
                (position - self.current_offset) / span,
            )
        }
    }
}
