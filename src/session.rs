use std::collections::HashMap;

use log::{debug, info};

use crate::{
    error::{FilterError, FilterResult},
    filter::{self, FilterDescriptor, Preset},
    frame::Frame,
    media::MediaKind,
    params::{self, Direction, ParamValues},
};

/// The active filter and the current parameter values of every filter.
///
/// Values only change through [`Session::set_param`] and [`Session::step`], which clamp
/// against bounds resolved from the frame passed in.
#[derive(Debug)]
pub struct Session {
    selected: Option<&'static FilterDescriptor>,
    values: HashMap<&'static str, ParamValues>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let values = filter::catalog()
            .iter()
            .map(|f| (f.name, ParamValues::defaults(f.params)))
            .collect();

        Self {
            selected: None,
            values,
        }
    }

    pub fn list_filters(&self, kind: MediaKind) -> Vec<&'static str> {
        filter::list_filters(kind)
    }

    /// Makes `name` the active filter. Its previously set values are kept.
    pub fn select(&mut self, name: &str) -> FilterResult<&'static str> {
        let spec = filter::lookup(name)?;
        self.selected = Some(spec);
        info!("selected filter {}", spec.name);
        Ok(spec.name)
    }

    pub fn selected(&self) -> Option<&'static str> {
        self.selected.map(|f| f.name)
    }

    /// Clamps `value` into the bounds resolved against `frame`, stores it and returns
    /// what was stored.
    pub fn set_param(
        &mut self,
        filter: &str,
        param: &str,
        value: i32,
        frame: &Frame,
    ) -> FilterResult<i32> {
        let stored = params::clamp_value(filter, param, value, frame)?;
        let values = self
            .values
            .get_mut(filter)
            .ok_or_else(|| FilterError::unknown_parameter(filter, param))?;

        let previous = values.get(param);
        values.set(param, stored);
        debug!("{filter}.{param}: {previous:?} -> {stored}");
        Ok(stored)
    }

    /// Moves a parameter by exactly one unit. The descriptor's declared step is not used.
    pub fn step(
        &mut self,
        filter: &str,
        param: &str,
        direction: Direction,
        frame: &Frame,
    ) -> FilterResult<i32> {
        let next = self.value(filter, param)?.saturating_add(direction.delta());
        self.set_param(filter, param, next, frame)
    }

    pub fn value(&self, filter: &str, param: &str) -> FilterResult<i32> {
        self.values
            .get(filter)
            .and_then(|values| values.get(param))
            .ok_or_else(|| FilterError::unknown_parameter(filter, param))
    }

    pub fn params(&self, filter: &str) -> FilterResult<&ParamValues> {
        self.values
            .get(filter)
            .ok_or_else(|| FilterError::UnknownFilter(filter.to_string()))
    }

    /// Restores one filter's defaults, clamped against `frame`.
    pub fn reset(&mut self, filter: &str, frame: &Frame) -> FilterResult<()> {
        let spec = filter::lookup(filter)?;
        for p in spec.params {
            self.set_param(spec.name, p.name, p.default, frame)?;
        }
        Ok(())
    }

    /// Runs the active filter over `frame` with its current values.
    pub fn apply(&self, frame: &Frame) -> FilterResult<Frame> {
        let spec = self.selected.ok_or(FilterError::NoFilterSelected)?;
        let values = self.params(spec.name)?.values();
        check_shape(spec.name, frame, spec.run(frame, &values))
    }

    pub fn apply_preset(&self, preset: Preset, frame: &Frame) -> FilterResult<Frame> {
        check_shape(preset.name(), frame, preset.apply(frame))
    }
}

fn check_shape(filter: &str, input: &Frame, output: Frame) -> FilterResult<Frame> {
    if output.dims() != input.dims() {
        return Err(FilterError::ShapeInvariantViolation {
            filter: filter.to_string(),
            expected: input.dims(),
            actual: output.dims(),
        });
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing_clamps_to_the_current_frame_height() {
        let mut session = Session::new();
        let tall = Frame::new(8, 120).unwrap();

        let mut spacing = |value, frame: &Frame| {
            session
                .set_param("scanlines", "spacing", value, frame)
                .unwrap()
        };
        assert_eq!(spacing(500, &tall), 120);
        assert_eq!(spacing(0, &tall), 1);
        assert_eq!(spacing(-3, &tall), 1);

        let short = Frame::new(8, 30).unwrap();
        assert_eq!(spacing(500, &short), 30);
        assert_eq!(session.value("scanlines", "spacing").unwrap(), 30);
    }

    #[test]
    fn step_moves_one_unit_and_respects_bounds() {
        let mut session = Session::new();
        let frame = Frame::new(4, 4).unwrap();

        let up = Direction::Up;
        assert_eq!(session.step("bit_depth", "bits", up, &frame).unwrap(), 5);
        session.set_param("bit_depth", "bits", 8, &frame).unwrap();
        assert_eq!(session.step("bit_depth", "bits", up, &frame).unwrap(), 8);

        let down = Direction::Down;
        assert_eq!(session.step("bit_depth", "bits", down, &frame).unwrap(), 7);
    }

    #[test]
    fn values_survive_reselection() {
        let mut session = Session::new();
        let frame = Frame::new(4, 4).unwrap();

        session.select("warmth").unwrap();
        session
            .set_param("warmth", "intensity", 42, &frame)
            .unwrap();
        session.select("contrast").unwrap();
        session.select("warmth").unwrap();
        assert_eq!(session.value("warmth", "intensity").unwrap(), 42);
    }

    #[test]
    fn apply_requires_a_selection() {
        let session = Session::new();
        let frame = Frame::new(2, 2).unwrap();
        assert!(matches!(
            session.apply(&frame),
            Err(FilterError::NoFilterSelected)
        ));
    }

    #[test]
    fn unknown_names_surface_immediately() {
        let mut session = Session::new();
        let frame = Frame::new(2, 2).unwrap();
        assert!(matches!(
            session.select("sepia"),
            Err(FilterError::UnknownFilter(_))
        ));
        assert!(session.selected().is_none());
        assert!(matches!(
            session.set_param("warmth", "spacing", 1, &frame),
            Err(FilterError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn apply_uses_current_values() {
        let mut session = Session::new();
        let frame = Frame::filled(3, 3, [100, 100, 100]).unwrap();

        session.select("warmth").unwrap();
        session
            .set_param("warmth", "intensity", 100, &frame)
            .unwrap();
        assert_eq!(session.apply(&frame).unwrap().pixel(1, 1), [60, 100, 140]);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut session = Session::new();
        let frame = Frame::new(4, 4).unwrap();

        session.set_param("noise", "intensity", 90, &frame).unwrap();
        session.reset("noise", &frame).unwrap();
        assert_eq!(session.params("noise").unwrap().values(), vec![10, 10, 20]);
    }

    #[test]
    fn shape_changes_are_caught() {
        let input = Frame::new(4, 4).unwrap();
        let output = Frame::new(2, 4).unwrap();
        assert!(matches!(
            check_shape("warp", &input, output),
            Err(FilterError::ShapeInvariantViolation { .. })
        ));
    }
}
