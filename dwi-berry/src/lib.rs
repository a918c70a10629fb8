#![warn(missing_docs)]

//! 核心库. 提供前列腺扩散加权成像 (DWI) 参数图的读取、选区掩码和
//! 纹理特征图计算.
//!
//! 该 crate 目前仅提供 `safe` 接口. 在非期望情况下, 程序会直接 panic,
//! 而不会导致内存错误. As what Rust promises.
//!
//! # 数据约定
//!
//! 1. 所有 3D 数据按照 `(z, H, W)` 模式访问, 其中 z 为切片方向.
//!   nii 文件中的 `(W, H, z)` 布局会在读取时转换.
//! 2. 特征图为 4D 数组, 形状为 `(z, H, W, 特征数)`. 未被掩码选中的
//!   体素在每个特征通道上均以 NaN 填充, 以区分 "未计算" 与 "计算结果为 0".
//!
//! # 功能总览
//!
//! ### 参数图与掩码 ✅
//!
//! [`DwiVolume`] 负责 nii 格式 3D/4D 参数图的读取;
//! [`Mask3d`] 与 [`SliceMask`] 负责布尔选区掩码, 包括旧式
//! ASCII 单切片掩码文件的读写与 3D 提升.
//!
//! 实现位于 `dwi-berry/src/data`.
//!
//! ### 灰度量化窗口 ✅
//!
//! 提供一个独立的灰度窗口对象 [`GrayWindow`], 以便将参数值转换为
//! 离散灰度级 (GLCM 等方法的输入) 或 8-bit 可视化灰度值.
//!
//! 实现位于 `dwi-berry/src/data/window.rs`.
//!
//! ### 滑动窗口迭代 ✅
//!
//! 行优先、惰性的 `(锚点, 窗口)` 迭代器, 支持按掩码跳过空窗口.
//!
//! 实现位于 `dwi-berry/src/data/swin.rs`.
//!
//! ### 纹理特征图 ✅
//!
//! [`texture::texture_map`] 是统一入口: 按窗口规格选择滑动窗口 /
//! 每切片最小包围盒 / 全选区三种计算模式, 返回特征图与特征名列表.
//! 各特征族 (统计量, GLCM, LBP, Gabor, HOG, Hu, Sobel, Haar, Zernike)
//! 的实现位于 `dwi-berry/src/texture/*`.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 3D 参数图与掩码的基础数据结构.
mod data;

pub use data::mask::{bounding_box_2d, Mask3d, MaskError, SliceMask};
pub use data::save::save_feat_slice;
pub use data::swin::sliding_window;
pub use data::window::GrayWindow;
pub use data::DwiVolume;

pub mod consts;

pub mod texture;

pub mod prelude;
