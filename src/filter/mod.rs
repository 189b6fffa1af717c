mod blur;
mod grade;
mod noise;
mod pixelate;
mod preset;
mod quantize;
mod remap;
mod scanlines;

pub use blur::blur;
pub use grade::{contrast, gamma, gamma_linear, saturation, vignette, warmth};
pub use noise::noise;
pub use pixelate::downscale_resolution;
pub use preset::{polaroid, Preset};
pub use quantize::{banding, banding_luminance, bit_depth, posterize};
pub use remap::{ca_linear, ca_radial, warp};
pub use scanlines::scanlines;

use crate::{
    error::{FilterError, FilterResult},
    frame::Frame,
    media::MediaKind,
    params::{Bound, ParamDescriptor},
};

/// A pure kernel taking its parameters positionally, in descriptor order.
pub type Kernel = fn(&Frame, &[i32]) -> Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCapability {
    Any,
    VideoOnly,
}

pub struct FilterDescriptor {
    pub name: &'static str,
    pub capability: MediaCapability,
    pub params: &'static [ParamDescriptor],
    kernel: Kernel,
}

impl FilterDescriptor {
    /// Runs the kernel. `values` must hold one entry per descriptor in `params`.
    pub fn run(&self, frame: &Frame, values: &[i32]) -> Frame {
        debug_assert_eq!(values.len(), self.params.len());
        (self.kernel)(frame, values)
    }

    pub fn param(&self, name: &str) -> Option<&'static ParamDescriptor> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn supports(&self, kind: MediaKind) -> bool {
        match self.capability {
            MediaCapability::Any => true,
            MediaCapability::VideoOnly => kind == MediaKind::Video,
        }
    }
}

impl std::fmt::Debug for FilterDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterDescriptor")
            .field("name", &self.name)
            .field("capability", &self.capability)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

const fn any(
    name: &'static str,
    params: &'static [ParamDescriptor],
    kernel: Kernel,
) -> FilterDescriptor {
    FilterDescriptor {
        name,
        capability: MediaCapability::Any,
        params,
        kernel,
    }
}

const INTENSITY: [ParamDescriptor; 1] = [ParamDescriptor::new("intensity", 0, -100, 100)];
const GAMMA: [ParamDescriptor; 1] = [ParamDescriptor::new("gamma", 100, 0, 500)];
const LEVELS: [ParamDescriptor; 1] = [ParamDescriptor::new("levels", 8, 2, 256)];

static CATALOG: [FilterDescriptor; 18] = [
    any("original", &[], |frame, _| frame.clone()),
    any(
        "scanlines",
        &[
            ParamDescriptor::new("intensity", 50, 0, 100),
            ParamDescriptor::new("spacing", 2, 1, 1).with_max(Bound::FrameHeight),
        ],
        |frame, p| scanlines(frame, p[0], p[1]),
    ),
    any(
        "blur",
        &[ParamDescriptor::new("blur_intensity", 1, 0, 50)],
        |frame, p| blur(frame, p[0]),
    ),
    any(
        "ca_linear",
        &[
            ParamDescriptor::new("shift_r", 5, -50, 50),
            ParamDescriptor::new("shift_g", 0, -50, 50),
            ParamDescriptor::new("shift_b", -5, -50, 50),
        ],
        |frame, p| ca_linear(frame, p[0], p[1], p[2]),
    ),
    any(
        "ca_radial",
        &[
            ParamDescriptor::new("strength_r", 2, -50, 50),
            ParamDescriptor::new("strength_g", 0, -50, 50),
            ParamDescriptor::new("strength_b", -2, -50, 50),
        ],
        |frame, p| ca_radial(frame, p[0], p[1], p[2]),
    ),
    any(
        "warp",
        &[ParamDescriptor::new("curvature", 20, 0, 100)],
        |frame, p| warp(frame, p[0]),
    ),
    any("saturation", &INTENSITY, |frame, p| saturation(frame, p[0])),
    any("warmth", &INTENSITY, |frame, p| warmth(frame, p[0])),
    any("contrast", &INTENSITY, |frame, p| contrast(frame, p[0])),
    any("vignette", &INTENSITY, |frame, p| vignette(frame, p[0])),
    any("gamma", &GAMMA, |frame, p| gamma(frame, p[0])),
    any("gamma_linear", &GAMMA, |frame, p| gamma_linear(frame, p[0])),
    any(
        "noise",
        &[
            ParamDescriptor::new("x_noise", 10, 0, 100),
            ParamDescriptor::new("y_noise", 10, 0, 100),
            ParamDescriptor::new("intensity", 20, 0, 100),
        ],
        |frame, p| noise(frame, p[0], p[1], p[2]),
    ),
    any(
        "posterize",
        &[ParamDescriptor::new("levels", 4, 2, 256)],
        |frame, p| posterize(frame, p[0]),
    ),
    any(
        "bit_depth",
        &[ParamDescriptor::new("bits", 4, 1, 8)],
        |frame, p| bit_depth(frame, p[0]),
    ),
    any(
        "downscale_resolution",
        &[ParamDescriptor::new("scale_percent", 50, 1, 100)],
        |frame, p| downscale_resolution(frame, p[0]),
    ),
    any("banding", &LEVELS, |frame, p| banding(frame, p[0])),
    any("banding_luminance", &LEVELS, |frame, p| {
        banding_luminance(frame, p[0])
    }),
    // Time-dependent filters register here with `MediaCapability::VideoOnly`.
];

pub fn catalog() -> &'static [FilterDescriptor] {
    &CATALOG
}

pub fn lookup(name: &str) -> FilterResult<&'static FilterDescriptor> {
    CATALOG
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| FilterError::UnknownFilter(name.to_string()))
}

/// Catalog names usable on `kind`, in catalog order.
pub fn list_filters(kind: MediaKind) -> Vec<&'static str> {
    CATALOG
        .iter()
        .filter(|f| f.supports(kind))
        .map(|f| f.name)
        .collect()
}
