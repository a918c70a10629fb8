use ndarray::{Array2, ArrayView2};

/// 灰度量化窗口, 包含量化下限、上限与灰度级数.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
///
/// 窗口承担两种职责: [`GrayWindow::quantize`] 将参数值映射到
/// `0..levels` 的离散灰度级, 供 GLCM 这类需要离散输入的方法使用;
/// [`GrayWindow::eval8`] 将参数值映射到 `0..=255`, 供可视化导出使用.
#[derive(Copy, Clone, Debug)]
pub struct GrayWindow {
    lower: f32,
    upper: f32,
    levels: u16,
}

impl Default for GrayWindow {
    /// 默认窗口为 ADC 参数图预设, 见 [`GrayWindow::from_adcm`].
    #[inline]
    fn default() -> Self {
        Self::from_adcm()
    }
}

impl GrayWindow {
    /// 构建灰度量化窗口.
    ///
    /// `lower` 与 `upper` 必须有限且 `lower < upper`,
    /// `levels` 必须在 `[2, 256]` 范围内, 否则返回 `None`.
    pub fn new(lower: f32, upper: f32, levels: u16) -> Option<GrayWindow> {
        if lower.is_finite() && upper.is_finite() && lower < upper && (2..=256).contains(&levels) {
            Some(Self {
                lower,
                upper,
                levels,
            })
        } else {
            None
        }
    }

    /// 构建一个适用于前列腺 ADC 参数图的量化窗口.
    /// 该窗口范围为 \[0, 0.005\], 灰度级数为 128.
    #[inline]
    pub const fn from_adcm() -> GrayWindow {
        Self {
            lower: crate::consts::ADCM_LOWER,
            upper: crate::consts::ADCM_UPPER,
            levels: crate::consts::DEFAULT_GRAY_LEVELS,
        }
    }

    /// 量化下限.
    #[inline]
    pub fn lower(&self) -> f32 {
        self.lower
    }

    /// 量化上限.
    #[inline]
    pub fn upper(&self) -> f32 {
        self.upper
    }

    /// 灰度级数.
    #[inline]
    pub fn levels(&self) -> u16 {
        self.levels
    }

    /// 求在当前窗口设置下, 参数值 `v` 对应的灰度级 (0 <= level < levels).
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn quantize(&self, v: f32) -> Option<u8> {
        if !v.is_finite() {
            return None;
        }
        let top = self.levels - 1;
        if v <= self.lower {
            Some(0)
        } else if v >= self.upper {
            Some(top as u8)
        } else {
            let frac = (v - self.lower) / (self.upper - self.lower);
            // 半开区间截断, 上限处饱和到 levels - 1.
            Some(((frac * self.levels as f32) as u16).min(top) as u8)
        }
    }

    /// 求在当前窗口设置下, 参数值 `v` 对应的灰度图像素整数值 (0 <= value <= 255).
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval8(&self, v: f32) -> Option<u8> {
        if !v.is_finite() {
            return None;
        }
        if v <= self.lower {
            Some(u8::MIN)
        } else if v >= self.upper {
            Some(u8::MAX)
        } else {
            // 255, not 256.
            Some((((v - self.lower) / (self.upper - self.lower)) * 255.0) as u8)
        }
    }

    /// 将整张 2D 切片量化为灰度级图. 无意义的值 (inf, NaN) 量化为 0.
    pub fn quantize_slice(&self, sli: ArrayView2<f32>) -> Array2<u8> {
        sli.mapv(|v| self.quantize(v).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::GrayWindow;

    fn is_valid_init(lower: f32, upper: f32, levels: u16) -> bool {
        GrayWindow::new(lower, upper, levels).is_some()
    }

    #[test]
    fn test_gray_window_invalid_input() {
        assert!(!is_valid_init(1.0, 0.0, 128));
        assert!(!is_valid_init(0.0, 0.0, 128));
        assert!(!is_valid_init(0.0, 1.0, 1));
        assert!(!is_valid_init(0.0, 1.0, 257));
        assert!(!is_valid_init(f32::NAN, 1.0, 128));
        assert!(is_valid_init(0.0, 1.0, 2));
    }

    #[test]
    fn test_gray_window_quantize() {
        // [0, 1], 4 级
        let gw = GrayWindow::new(0.0, 1.0, 4).unwrap();
        assert_eq!(gw.quantize(f32::NAN), None);
        assert_eq!(gw.quantize(f32::INFINITY), None);

        assert_eq!(gw.quantize(-1.0), Some(0));
        assert_eq!(gw.quantize(0.0), Some(0));
        assert_eq!(gw.quantize(0.1), Some(0));
        assert_eq!(gw.quantize(0.3), Some(1));
        assert_eq!(gw.quantize(0.6), Some(2));
        assert_eq!(gw.quantize(0.9), Some(3));
        assert_eq!(gw.quantize(1.0), Some(3));
        assert_eq!(gw.quantize(2.0), Some(3));
    }

    #[test]
    fn test_gray_window_eval8() {
        let gw = GrayWindow::new(0.0, 1.0, 128).unwrap();
        assert_eq!(gw.eval8(f32::MIN), Some(0));
        assert_eq!(gw.eval8(f32::MAX), Some(255));
        assert_eq!(gw.eval8(0.25).unwrap(), (255.0 * 0.25) as u8);
        assert_eq!(gw.eval8(0.5).unwrap(), (255.0 * 0.5) as u8);

        // boundary
        assert_eq!(gw.eval8(0.9999), Some(254));
        assert_eq!(gw.eval8(1.0), Some(u8::MAX));
    }

    #[test]
    fn test_gray_window_adcm_preset() {
        let gw = GrayWindow::from_adcm();
        assert_eq!(gw.levels(), 128);
        assert_eq!(gw.quantize(0.0), Some(0));
        assert_eq!(gw.quantize(1.0), Some(127));
    }
}
