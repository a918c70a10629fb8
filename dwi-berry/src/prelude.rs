//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::mask::{Mask3d, MaskError, SliceMask};
pub use crate::data::window::GrayWindow;
pub use crate::data::DwiVolume;

pub use crate::texture::{texture_map, Method, Mode, TextureConfig, TextureError, WinSpec};

pub use crate::data::save::save_feat_slice;
pub use crate::data::swin::sliding_window;
