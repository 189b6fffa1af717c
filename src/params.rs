use std::{fmt, str::FromStr};

use log::debug;

use crate::{
    error::{FilterError, FilterResult},
    filter,
    frame::Frame,
};

/// One end of a parameter's legal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Constant(i32),
    FrameHeight,
    FrameWidth,
}

impl Bound {
    pub fn resolve(self, frame: &Frame) -> i32 {
        match self {
            Bound::Constant(n) => n,
            Bound::FrameHeight => i32::try_from(frame.height()).unwrap_or(i32::MAX),
            Bound::FrameWidth => i32::try_from(frame.width()).unwrap_or(i32::MAX),
        }
    }
}

/// Presentation hint for front-ends; the engine never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiHint {
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub name: &'static str,
    pub default: i32,
    pub min: Bound,
    pub max: Bound,
    /// Declared step size. Stepping always moves by one regardless.
    pub step: i32,
    pub ui: UiHint,
}

impl ParamDescriptor {
    pub const fn new(name: &'static str, default: i32, min: i32, max: i32) -> Self {
        Self {
            name,
            default,
            min: Bound::Constant(min),
            max: Bound::Constant(max),
            step: 1,
            ui: UiHint::Scale,
        }
    }

    pub const fn with_max(mut self, max: Bound) -> Self {
        self.max = max;
        self
    }

    pub fn bounds(&self, frame: &Frame) -> ResolvedBounds {
        ResolvedBounds {
            min: self.min.resolve(frame),
            max: self.max.resolve(frame),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedBounds {
    pub min: i32,
    pub max: i32,
}

impl ResolvedBounds {
    pub fn clamp(&self, value: i32) -> i32 {
        value.max(self.min).min(self.max)
    }
}

impl fmt::Display for ResolvedBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn delta(self) -> i32 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }
}

impl FromStr for Direction {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" | "up" => Ok(Direction::Up),
            "-" | "down" => Ok(Direction::Down),
            other => Err(FilterError::invalid_argument(format!(
                "step direction must be '+' or '-', got '{other}'"
            ))),
        }
    }
}

/// Current values of one filter's parameters, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamValues {
    entries: Vec<(&'static str, i32)>,
}

impl ParamValues {
    pub fn defaults(descriptors: &[ParamDescriptor]) -> Self {
        Self {
            entries: descriptors.iter().map(|d| (d.name, d.default)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|&(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        self.entries.iter().copied()
    }

    /// Positional values handed to the kernel.
    pub fn values(&self) -> Vec<i32> {
        self.entries.iter().map(|&(_, value)| value).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn set(&mut self, name: &str, value: i32) {
        if let Some(entry) = self.entries.iter_mut().find(|(entry, _)| *entry == name) {
            entry.1 = value;
        }
    }
}

pub fn descriptor(filter: &str, param: &str) -> FilterResult<&'static ParamDescriptor> {
    let unknown = || FilterError::unknown_parameter(filter, param);
    let spec = filter::lookup(filter).map_err(|_| unknown())?;
    spec.param(param).ok_or_else(unknown)
}

/// Evaluates the legal range of `filter.param` against `frame`.
pub fn resolve_bounds(filter: &str, param: &str, frame: &Frame) -> FilterResult<ResolvedBounds> {
    Ok(descriptor(filter, param)?.bounds(frame))
}

/// Clamps `value` into the resolved range, logging when it had to move.
pub(crate) fn clamp_value(
    filter: &str,
    param: &str,
    value: i32,
    frame: &Frame,
) -> FilterResult<i32> {
    let bounds = resolve_bounds(filter, param, frame)?;
    let clamped = bounds.clamp(value);
    if clamped != value {
        debug!("{filter}.{param}: {value} clamped to {clamped} within {bounds}");
    }
    Ok(clamped)
}
