//! 通用常量.

/// 单通道颜色.
pub mod gray {
    /// 单通道黑色. 可视化导出时作为背景色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;
}

/// ADC 参数图常用的量化下限 (mm²/s).
pub const ADCM_LOWER: f32 = 0.0;

/// ADC 参数图常用的量化上限 (mm²/s).
///
/// 前列腺 DWI 的 ADC 值绝大多数落在该范围内, 超出部分按饱和处理.
pub const ADCM_UPPER: f32 = 0.005;

/// 默认灰度级数.
pub const DEFAULT_GRAY_LEVELS: u16 = 128;

/// GLCM 共生矩阵使用的像素对距离集合.
pub const GLCM_DISTANCES: [usize; 4] = [1, 2, 3, 4];

/// Gabor 滤波器组的 sigma 集合.
pub const GABOR_SIGMAS: [f64; 3] = [1.0, 2.0, 3.0];

/// Gabor 滤波器组的频率集合. 频率为波长的倒数.
pub const GABOR_FREQS: [f64; 4] = [0.1, 0.2, 0.3, 0.4];

/// LBP 采样邻居个数.
pub const LBP_NEIGHBOURS: usize = 8;

/// HOG 方向直方图的 bin 个数.
pub const HOG_ORIENTATIONS: usize = 8;

/// Zernike 矩的最高阶数.
pub const ZERNIKE_DEGREE: usize = 8;
