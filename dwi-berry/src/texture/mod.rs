//! 纹理特征图计算.
//!
//! 纹理方法分三种计算模式: [`Mode::Window`] 以滑动窗口逐位置计算
//! 特征图; [`Mode::Mbb`] 对每张切片的选中体素统一计算一组特征值;
//! [`Mode::All`] 对全部切片的选中体素统一计算一组特征值.
//!
//! 输出要么是逐体素特征图 (单值模式下将特征值铺满选中体素),
//! 要么在要求平均时缩减为每特征一个标量.
//!
//! 统一入口为 [`texture_map`]; 各特征族的计算函数位于对应子模块,
//! 也可以单独使用.

use std::fmt;
use std::str::FromStr;

use itertools::izip;
use ndarray::{s, Array2, Array3, Array4, ArrayView2, ArrayView3, ArrayView4, ArrayViewMut4, Axis};

use crate::data::mask::Mask3d;
use crate::data::window::GrayWindow;

mod error;

pub mod gabor;
pub mod glcm;
pub mod haar;
pub mod hog;
pub mod lbp;
pub mod moments;
pub mod sobel;
pub mod stats;

pub use error::TextureError;

/// 纹理方法的计算模式.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    /// 滑动窗口逐位置计算.
    Window,

    /// 每张切片的选中体素统一计算 (最小包围盒).
    Mbb,

    /// 全部切片的选中体素统一计算.
    All,
}

/// 窗口规格: 滑动窗口边长, 或两种单值模式之一的字面量.
///
/// 字符串形式分别为十进制正整数、`"mbb"` 与 `"all"`;
/// 特征名总以该字符串形式为前缀, 以便区分不同规格下的同名特征.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WinSpec {
    /// 滑动窗口, 参数为窗口边长 (像素).
    Win(usize),

    /// 每切片最小包围盒模式.
    Mbb,

    /// 全选区模式.
    All,
}

impl WinSpec {
    /// 该窗口规格要求的计算模式.
    #[inline]
    pub fn mode(&self) -> Mode {
        match self {
            Self::Win(_) => Mode::Window,
            Self::Mbb => Mode::Mbb,
            Self::All => Mode::All,
        }
    }
}

impl fmt::Display for WinSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Win(n) => write!(f, "{n}"),
            Self::Mbb => write!(f, "mbb"),
            Self::All => write!(f, "all"),
        }
    }
}

impl FromStr for WinSpec {
    type Err = TextureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mbb" => Ok(Self::Mbb),
            "all" => Ok(Self::All),
            other => other
                .parse::<usize>()
                .ok()
                .filter(|n| *n >= 1)
                .map(Self::Win)
                .ok_or_else(|| TextureError::BadWinSpec(other.to_owned())),
        }
    }
}

/// 纹理方法注册表: 一个封闭的方法集合, 每个方法携带自己的计算模式.
///
/// 新方法通过添加变体注册, 分派逻辑由模式匹配穷尽检查.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Method {
    /// 基本统计特征 (滑动窗口).
    Stats,

    /// 灰度共生矩阵特征 (滑动窗口).
    Glcm,

    /// 局部二值模式频率特征 (滑动窗口).
    Lbp,

    /// Gabor 滤波特征 (滑动窗口).
    Gabor,

    /// 方向梯度直方图特征 (滑动窗口).
    Hog,

    /// Hu 矩特征 (滑动窗口).
    Hu,

    /// Sobel 边缘特征 (整切片计算, 滑动窗口模式下调用).
    Sobel,

    /// Haar 小波特征 (滑动窗口).
    Haar,

    /// Zernike 矩特征 (滑动窗口).
    Zernike,

    /// 基本统计特征 (每切片单值模式).
    StatsMbb,

    /// 灰度共生矩阵特征 (每切片单值模式).
    GlcmMbb,

    /// 基本统计特征 (全选区单值模式).
    StatsAll,
}

impl Method {
    /// 全部已注册方法, 窗口方法在前.
    pub const ALL: [Method; 12] = [
        Self::Stats,
        Self::Glcm,
        Self::Lbp,
        Self::Gabor,
        Self::Hog,
        Self::Hu,
        Self::Sobel,
        Self::Haar,
        Self::Zernike,
        Self::StatsMbb,
        Self::GlcmMbb,
        Self::StatsAll,
    ];

    /// 方法名.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stats => "stats",
            Self::Glcm => "glcm",
            Self::Lbp => "lbp",
            Self::Gabor => "gabor",
            Self::Hog => "hog",
            Self::Hu => "hu",
            Self::Sobel => "sobel",
            Self::Haar => "haar",
            Self::Zernike => "zernike",
            Self::StatsMbb => "stats_mbb",
            Self::GlcmMbb => "glcm_mbb",
            Self::StatsAll => "stats_all",
        }
    }

    /// 该方法声明的计算模式.
    pub fn mode(&self) -> Mode {
        match self {
            Self::Stats
            | Self::Glcm
            | Self::Lbp
            | Self::Gabor
            | Self::Hog
            | Self::Hu
            | Self::Sobel
            | Self::Haar
            | Self::Zernike => Mode::Window,
            Self::StatsMbb | Self::GlcmMbb => Mode::Mbb,
            Self::StatsAll => Mode::All,
        }
    }

    /// 该方法在给定窗口规格下的特征名列表 (不含窗口规格前缀).
    ///
    /// 特征名与特征图末轴一一对应, 无需实际计算即可获得.
    /// 如果窗口规格与方法模式不匹配, 则程序 panic.
    pub fn feature_names(&self, winspec: WinSpec) -> Vec<String> {
        assert_eq!(
            self.mode(),
            winspec.mode(),
            "方法 {} 与窗口规格 {winspec} 模式不匹配",
            self.name()
        );
        match (*self, winspec) {
            (Self::Stats, _) => stats::names(),
            (Self::Glcm, _) => glcm::names(),
            (Self::Lbp, WinSpec::Win(size)) => lbp::names(size / 2),
            (Self::Gabor, _) => gabor::names(),
            (Self::Hog, _) => hog::names(),
            (Self::Hu, _) => moments::hu_names(),
            (Self::Sobel, _) => sobel::names(),
            (Self::Haar, _) => haar::names(),
            (Self::Zernike, _) => moments::zernike_names(),
            (Self::StatsMbb | Self::StatsAll, _) => stats::names(),
            (Self::GlcmMbb, _) => glcm::names(),
            (Self::Lbp, _) => unreachable!("模式匹配已在上方检查"),
        }
    }

    /// 滑动窗口模式下计算一张切片的特征图, 形状 `(H, W, 特征数)`,
    /// 未计算的位置保持 0 填充.
    fn slice_map<'a>(
        &self,
        sli: ArrayView2<'a, f32>,
        size: usize,
        mask: ArrayView2<'a, bool>,
        gw: &GrayWindow,
    ) -> Array3<f32> {
        match self {
            Self::Stats => stats::map(sli, size, mask),
            Self::Glcm => glcm::map(sli, size, mask, gw),
            Self::Lbp => lbp::map(sli, size, mask),
            Self::Gabor => gabor::map(sli, size, mask),
            Self::Hog => hog::map(sli, size, mask),
            Self::Hu => moments::hu_map(sli, size, mask),
            Self::Sobel => sobel::map(sli, mask),
            Self::Haar => haar::map(sli, size, mask),
            Self::Zernike => moments::zernike_map(sli, size, mask),
            Self::StatsMbb | Self::GlcmMbb | Self::StatsAll => {
                unreachable!("单值方法不会以滑动窗口模式分派")
            }
        }
    }

    /// 单值模式下对一张切片的选中体素计算一组特征值.
    fn region(&self, sli: ArrayView2<f32>, mask: ArrayView2<bool>, gw: &GrayWindow) -> Vec<f32> {
        match self {
            Self::StatsMbb | Self::StatsAll => stats::region(sli, mask),
            Self::GlcmMbb => glcm::region(sli, mask, gw),
            _ => unreachable!("窗口方法不会以单值模式分派"),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = TextureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| TextureError::UnknownMethod(s.to_owned()))
    }
}

/// 单次纹理计算的配置. 不存在任何进程级可变配置,
/// 所有选项都经由该结构显式传入.
#[derive(Default)]
pub struct TextureConfig<'a> {
    /// 为 `true` 时, 将输出缩减为选中体素上的平均值,
    /// 形状退化为 `(1, 1, 1, 特征数)`.
    pub average: bool,

    /// 灰度量化窗口, 供 GLCM 等需要离散灰度输入的方法使用.
    pub gray: GrayWindow,

    /// 可选的外部预分配输出数组, 仅滑动窗口模式使用.
    ///
    /// 给定时, 特征图按切片写入该数组而不在内部分配; 数组应以 NaN
    /// 预填充, 形状必须为 `参数图形状 + (特征数,)`. 向外部数组写入
    /// 较慢, 计算时会记录一条性能警告.
    pub sink: Option<ArrayViewMut4<'a, f32>>,
}

/// 纹理特征图计算的统一入口.
///
/// 给定 3D 参数图 `img`、方法 `method`、窗口规格 `winspec` 与选区掩码
/// `mask`, 返回特征图与特征名列表. 特征名带有窗口规格前缀
/// (如 `5-stats(mean)`), 与特征图末轴一一对应.
///
/// 未被掩码选中的体素在逐体素特征图中以 NaN 填充;
/// `mask` 为 `None` 时不选中任何体素, 特征图全为 NaN.
/// 没有任何选中体素的切片被整体跳过.
///
/// 返回的特征图仅在结果写入外部输出数组 (`cfg.sink`, 且未要求平均)
/// 时为 `None`.
///
/// # 错误
///
/// 所有配置错误 (形状不一致、模式不匹配、窗口越界、外部数组形状不符)
/// 在计算开始前返回; 特征函数自身 panic 时整次计算中止, 不产生部分结果.
pub fn texture_map(
    img: ArrayView3<f32>,
    method: Method,
    winspec: WinSpec,
    mask: Option<&Mask3d>,
    cfg: TextureConfig<'_>,
) -> Result<(Option<Array4<f32>>, Vec<String>), TextureError> {
    if let Some(m) = mask {
        if m.shape() != img.dim() {
            return Err(TextureError::ShapeMismatch(m.shape(), img.dim()));
        }
    }
    if method.mode() != winspec.mode() {
        return Err(TextureError::ModeMismatch(method.name(), winspec.to_string()));
    }

    let TextureConfig {
        average,
        gray,
        sink,
    } = cfg;
    let names: Vec<String> = method
        .feature_names(winspec)
        .iter()
        .map(|n| format!("{winspec}-{n}"))
        .collect();
    let nfeat = names.len();

    match winspec {
        WinSpec::Win(size) => {
            let (_, h, w) = img.dim();
            if size == 0 || size > h || size > w {
                return Err(TextureError::BadWindow(size, (h, w)));
            }
            windowed(img, method, size, mask, &gray, average, sink, names)
        }
        WinSpec::Mbb => {
            let tmap = region_map(img, method, mask, &gray, nfeat, false);
            let out = if average {
                mbb_average(&tmap)
            } else {
                tmap
            };
            Ok((Some(out), names))
        }
        WinSpec::All => {
            let tmap = region_map(img, method, mask, &gray, nfeat, true);
            let out = if average {
                all_average(&tmap)
            } else {
                tmap
            };
            Ok((Some(out), names))
        }
    }
}

/// 滑动窗口模式: 逐切片计算并写入内部或外部输出数组.
#[allow(clippy::too_many_arguments)]
fn windowed(
    img: ArrayView3<f32>,
    method: Method,
    size: usize,
    mask: Option<&Mask3d>,
    gw: &GrayWindow,
    average: bool,
    mut sink: Option<ArrayViewMut4<'_, f32>>,
    names: Vec<String>,
) -> Result<(Option<Array4<f32>>, Vec<String>), TextureError> {
    let (z, h, w) = img.dim();
    let nfeat = names.len();

    let mut owned = None;
    match &sink {
        Some(sk) => {
            let expect = [z, h, w, nfeat];
            let (d0, d1, d2, d3) = sk.dim();
            let got = [d0, d1, d2, d3];
            if got != expect {
                return Err(TextureError::SinkShape(got, expect));
            }
            log::warn!("特征图将写入外部输出数组, 该路径较慢, 大体积数据请评估耗时");
        }
        None => owned = Some(Array4::from_elem((z, h, w, nfeat), f32::NAN)),
    }

    for zi in 0..z {
        // 掩码缺失等价于未选中任何体素: 所有切片都被跳过.
        let msl = match mask {
            Some(m) => m.slice_at(zi),
            None => continue,
        };
        if !msl.iter().any(|&b| b) {
            continue;
        }
        let mut feats = method.slice_map(img.index_axis(Axis(0), zi), size, msl, gw);
        debug_assert_eq!(feats.dim(), (h, w, nfeat));
        // 未选中的位置以 NaN 覆盖; 选中但窗口未覆盖的位置保持缓冲区的 0 填充.
        for ((i, j), &sel) in msl.indexed_iter() {
            if !sel {
                feats.slice_mut(s![i, j, ..]).fill(f32::NAN);
            }
        }
        match (owned.as_mut(), sink.as_mut()) {
            (Some(o), _) => o.index_axis_mut(Axis(0), zi).assign(&feats),
            (None, Some(sk)) => sk.index_axis_mut(Axis(0), zi).assign(&feats),
            (None, None) => unreachable!(),
        }
    }

    if average {
        let src = match (&owned, &sink) {
            (Some(o), _) => o.view(),
            (None, Some(sk)) => sk.view(),
            (None, None) => unreachable!(),
        };
        return Ok((Some(mean_selected(src, mask, nfeat)), names));
    }
    Ok((owned, names))
}

/// 单值模式: 逐切片 (`whole_volume` 为 `false`) 或整卷
/// (`whole_volume` 为 `true`) 计算特征值并铺满选中体素.
fn region_map(
    img: ArrayView3<f32>,
    method: Method,
    mask: Option<&Mask3d>,
    gw: &GrayWindow,
    nfeat: usize,
    whole_volume: bool,
) -> Array4<f32> {
    let (z, h, w) = img.dim();
    let mut tmap = Array4::from_elem((z, h, w, nfeat), f32::NAN);
    let Some(m) = mask else {
        return tmap;
    };

    if whole_volume {
        if m.n_selected() == 0 {
            return tmap;
        }
        // 全部选中体素压平成一张 1 x N 的虚拟切片, 复用切片级特征函数.
        let voxels = m.selected(img);
        let n = voxels.len();
        // 形状与数据长度一致, 不会产生 Err.
        let flat_img = Array2::from_shape_vec((1, n), voxels).unwrap();
        let flat_mask = Array2::from_elem((1, n), true);
        let feats = method.region(flat_img.view(), flat_mask.view(), gw);
        debug_assert_eq!(feats.len(), nfeat);
        for ((zi, i, j), &sel) in m.data().indexed_iter() {
            if sel {
                for (dst, &v) in izip!(tmap.slice_mut(s![zi, i, j, ..]), &feats) {
                    *dst = v;
                }
            }
        }
        return tmap;
    }

    for zi in 0..z {
        let msl = m.slice_at(zi);
        if !msl.iter().any(|&b| b) {
            continue;
        }
        let feats = method.region(img.index_axis(Axis(0), zi), msl, gw);
        debug_assert_eq!(feats.len(), nfeat);
        for ((i, j), &sel) in msl.indexed_iter() {
            if sel {
                for (dst, &v) in izip!(tmap.slice_mut(s![zi, i, j, ..]), &feats) {
                    *dst = v;
                }
            }
        }
    }
    tmap
}

/// 非 NaN 值的算术平均. 全为 NaN 或为空时返回 NaN.
fn nanmean(vals: impl Iterator<Item = f32>) -> f32 {
    let mut sum = 0.0f64;
    let mut count = 0u64;
    for v in vals.filter(|v| !v.is_nan()) {
        sum += v as f64;
        count += 1;
    }
    if count == 0 {
        f32::NAN
    } else {
        (sum / count as f64) as f32
    }
}

/// 滑动窗口模式的平均: 选中体素上的普通算术平均.
fn mean_selected(src: ArrayView4<f32>, mask: Option<&Mask3d>, nfeat: usize) -> Array4<f32> {
    let mut sum = vec![0.0f64; nfeat];
    let mut count = 0u64;
    if let Some(m) = mask {
        for ((zi, i, j), &sel) in m.data().indexed_iter() {
            if sel {
                count += 1;
                for (p, acc) in sum.iter_mut().enumerate() {
                    *acc += src[(zi, i, j, p)] as f64;
                }
            }
        }
    }
    let mut out = Array4::from_elem((1, 1, 1, nfeat), f32::NAN);
    if count > 0 {
        for (p, acc) in sum.into_iter().enumerate() {
            out[(0, 0, 0, p)] = (acc / count as f64) as f32;
        }
    }
    out
}

/// 每切片单值模式的平均: 先在切片内取平均 (切片内各选中体素取值相同),
/// 再跨切片取平均; 无选中体素的切片 (全 NaN) 不参与.
fn mbb_average(tmap: &Array4<f32>) -> Array4<f32> {
    let (z, _, _, nfeat) = tmap.dim();
    let mut out = Array4::from_elem((1, 1, 1, nfeat), f32::NAN);
    for p in 0..nfeat {
        let per_slice =
            (0..z).map(|zi| nanmean(tmap.slice(s![zi, .., .., p]).iter().copied()));
        out[(0, 0, 0, p)] = nanmean(per_slice);
    }
    out
}

/// 全选区单值模式的平均: 数值上是恒等变换, 仅做形状归一.
fn all_average(tmap: &Array4<f32>) -> Array4<f32> {
    let nfeat = tmap.dim().3;
    let mut out = Array4::from_elem((1, 1, 1, nfeat), f32::NAN);
    for p in 0..nfeat {
        out[(0, 0, 0, p)] = nanmean(tmap.slice(s![.., .., .., p]).iter().copied());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{texture_map, Method, Mode, TextureConfig, TextureError, WinSpec};
    use crate::data::mask::Mask3d;
    use ndarray::{Array3, Array4, Axis};

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn ones(z: usize, h: usize, w: usize) -> Array3<f32> {
        Array3::from_elem((z, h, w), 1.0)
    }

    fn full_mask(z: usize, h: usize, w: usize) -> Mask3d {
        Mask3d::new(Array3::from_elem((z, h, w), true))
    }

    /// 只选中第 0 层切片的掩码.
    fn slice0_mask(z: usize, h: usize, w: usize) -> Mask3d {
        let mut m = Array3::from_elem((z, h, w), false);
        m.index_axis_mut(Axis(0), 0).fill(true);
        Mask3d::new(m)
    }

    fn winspec_for(m: Method) -> WinSpec {
        match m.mode() {
            Mode::Window => WinSpec::Win(5),
            Mode::Mbb => WinSpec::Mbb,
            Mode::All => WinSpec::All,
        }
    }

    #[test]
    fn test_names_match_channels_for_every_method() {
        let img = Array3::from_shape_fn((1, 6, 6), |(_, i, j)| (i * 6 + j) as f32 * 1e-4);
        let mask = full_mask(1, 6, 6);
        for method in Method::ALL {
            let winspec = winspec_for(method);
            let (tmap, names) = texture_map(
                img.view(),
                method,
                winspec,
                Some(&mask),
                TextureConfig::default(),
            )
            .unwrap();
            let tmap = tmap.unwrap();
            assert_eq!(
                tmap.shape()[3],
                names.len(),
                "方法 {method} 的特征名与通道数不一致"
            );
            let prefix = format!("{winspec}-");
            assert!(names.iter().all(|n| n.starts_with(&prefix)));
        }
    }

    #[test]
    fn test_unselected_voxels_are_nan() {
        let img = ones(2, 5, 5);
        let mask = slice0_mask(2, 5, 5);
        let (tmap, _) = texture_map(
            img.view(),
            Method::Stats,
            WinSpec::Win(3),
            Some(&mask),
            TextureConfig::default(),
        )
        .unwrap();
        let tmap = tmap.unwrap();
        // 完全未选中的切片整体保持 NaN.
        assert!(tmap.index_axis(Axis(0), 1).iter().all(|v| v.is_nan()));
        // 选中切片的窗口锚点处为计算值, 不是 NaN 也不是 0.
        assert!(float_eq(tmap[(0, 2, 2, 0)], 1.0));
    }

    /// 观察到的切片级跳过规则的记录: 切片只要存在选中体素就会整体计算,
    /// 选中但距边界不足半个窗口的位置得不到锚点, 保留缓冲区的 0 填充
    /// (而非 NaN). 这里原样保留该行为, 不做逐位置的 "修正".
    #[test]
    fn test_selected_border_keeps_buffer_fill() {
        let img = ones(1, 4, 4);
        let mask = full_mask(1, 4, 4);
        let (tmap, _) = texture_map(
            img.view(),
            Method::Stats,
            WinSpec::Win(3),
            Some(&mask),
            TextureConfig::default(),
        )
        .unwrap();
        let tmap = tmap.unwrap();
        // 锚点只会落在内部 2x2 区域.
        assert!(float_eq(tmap[(0, 1, 1, 0)], 1.0));
        assert!(float_eq(tmap[(0, 0, 0, 0)], 0.0));
        assert!(!tmap[(0, 0, 0, 0)].is_nan());
    }

    #[test]
    fn test_map_average_over_selected() {
        let img = ones(1, 4, 4);
        let mask = full_mask(1, 4, 4);
        let cfg = TextureConfig {
            average: true,
            ..Default::default()
        };
        let (tmap, names) = texture_map(
            img.view(),
            Method::Stats,
            WinSpec::Win(3),
            Some(&mask),
            cfg,
        )
        .unwrap();
        let tmap = tmap.unwrap();
        assert_eq!(tmap.dim(), (1, 1, 1, names.len()));
        // 16 个选中体素中 4 个锚点为 1, 其余保持 0 填充: 平均 0.25.
        assert!(float_eq(tmap[(0, 0, 0, 0)], 0.25));
    }

    #[test]
    fn test_idempotent() {
        let img = Array3::from_shape_fn((2, 5, 5), |(z, i, j)| (z * 25 + i * 5 + j) as f32);
        let mask = full_mask(2, 5, 5);
        let run = || {
            texture_map(
                img.view(),
                Method::Stats,
                WinSpec::Win(3),
                Some(&mask),
                TextureConfig::default(),
            )
            .unwrap()
            .0
            .unwrap()
        };
        let (a, b) = (run(), run());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!(x.is_nan() == y.is_nan());
            if !x.is_nan() {
                assert_eq!(x, y);
            }
        }
    }

    #[test]
    fn test_stats_all_scenario() {
        // 2x4x4 全 1 参数图, 只选中第 0 层: "all" 模式下第 1 层全 NaN,
        // 第 0 层的 mean/stddev/range 分别为 1/0/0.
        let img = ones(2, 4, 4);
        let mask = slice0_mask(2, 4, 4);
        let (tmap, names) = texture_map(
            img.view(),
            Method::StatsAll,
            WinSpec::All,
            Some(&mask),
            TextureConfig::default(),
        )
        .unwrap();
        let tmap = tmap.unwrap();
        assert_eq!(names[0], "all-stats(mean)");
        assert!(tmap.index_axis(Axis(0), 1).iter().all(|v| v.is_nan()));
        for i in 0..4 {
            for j in 0..4 {
                assert!(float_eq(tmap[(0, i, j, 0)], 1.0)); // mean
                assert!(float_eq(tmap[(0, i, j, 1)], 0.0)); // stddev
                assert!(float_eq(tmap[(0, i, j, 2)], 0.0)); // range
            }
        }
    }

    #[test]
    fn test_stats_mbb_scenario() {
        let img = ones(2, 4, 4);
        let mask = slice0_mask(2, 4, 4);
        let (tmap, names) = texture_map(
            img.view(),
            Method::StatsMbb,
            WinSpec::Mbb,
            Some(&mask),
            TextureConfig::default(),
        )
        .unwrap();
        let tmap = tmap.unwrap();
        assert_eq!(names[0], "mbb-stats(mean)");
        assert!(tmap.index_axis(Axis(0), 1).iter().all(|v| v.is_nan()));
        // 第 0 层每个选中位置广播同一组特征值.
        for i in 0..4 {
            for j in 0..4 {
                assert!(float_eq(tmap[(0, i, j, 0)], 1.0));
                assert!(float_eq(tmap[(0, i, j, 1)], 0.0));
            }
        }
    }

    #[test]
    fn test_averaging_law_mbb_and_all() {
        // 两张切片选中体素个数相同, 平均值应等于逐体素输出在选中体素上的均值.
        let mut img = ones(2, 4, 4);
        img.index_axis_mut(Axis(0), 1).fill(2.0);
        let mask = full_mask(2, 4, 4);

        for (method, winspec) in [
            (Method::StatsMbb, WinSpec::Mbb),
            (Method::StatsAll, WinSpec::All),
        ] {
            let (plain, _) = texture_map(
                img.view(),
                method,
                winspec,
                Some(&mask),
                TextureConfig::default(),
            )
            .unwrap();
            let plain = plain.unwrap();
            let cfg = TextureConfig {
                average: true,
                ..Default::default()
            };
            let (avg, _) =
                texture_map(img.view(), method, winspec, Some(&mask), cfg).unwrap();
            let avg = avg.unwrap();

            let nfeat = plain.dim().3;
            for p in 0..nfeat {
                let vals: Vec<f32> = plain
                    .slice(ndarray::s![.., .., .., p])
                    .iter()
                    .copied()
                    .filter(|v| !v.is_nan())
                    .collect();
                let expect = vals.iter().sum::<f32>() / vals.len() as f32;
                assert!(
                    float_eq(avg[(0, 0, 0, p)], expect),
                    "通道 {p} 的平均值不满足平均律"
                );
            }
        }
    }

    #[test]
    fn test_mode_mismatch_fails_fast() {
        let img = ones(1, 5, 5);
        let mask = full_mask(1, 5, 5);
        let r = texture_map(
            img.view(),
            Method::Stats,
            WinSpec::Mbb,
            Some(&mask),
            TextureConfig::default(),
        );
        assert_eq!(r.unwrap_err(), TextureError::ModeMismatch("stats", "mbb".into()));

        let r = texture_map(
            img.view(),
            Method::StatsMbb,
            WinSpec::Win(3),
            Some(&mask),
            TextureConfig::default(),
        );
        assert!(matches!(r, Err(TextureError::ModeMismatch("stats_mbb", _))));

        let r = texture_map(
            img.view(),
            Method::GlcmMbb,
            WinSpec::All,
            Some(&mask),
            TextureConfig::default(),
        );
        assert!(matches!(r, Err(TextureError::ModeMismatch("glcm_mbb", _))));
    }

    #[test]
    fn test_oversized_window_fails() {
        let img = ones(2, 4, 4);
        let mask = full_mask(2, 4, 4);
        let r = texture_map(
            img.view(),
            Method::Stats,
            WinSpec::Win(5),
            Some(&mask),
            TextureConfig::default(),
        );
        assert_eq!(r.unwrap_err(), TextureError::BadWindow(5, (4, 4)));
    }

    #[test]
    fn test_shape_mismatch_fails() {
        let img = ones(2, 4, 4);
        let mask = full_mask(1, 4, 4);
        let r = texture_map(
            img.view(),
            Method::Stats,
            WinSpec::Win(3),
            Some(&mask),
            TextureConfig::default(),
        );
        assert_eq!(
            r.unwrap_err(),
            TextureError::ShapeMismatch((1, 4, 4), (2, 4, 4))
        );
    }

    #[test]
    fn test_absent_mask_selects_nothing() {
        let img = ones(2, 5, 5);
        let (tmap, names) = texture_map(
            img.view(),
            Method::Stats,
            WinSpec::Win(3),
            None,
            TextureConfig::default(),
        )
        .unwrap();
        let tmap = tmap.unwrap();
        assert_eq!(tmap.shape()[3], names.len());
        assert!(tmap.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_external_sink() {
        let img = ones(1, 4, 4);
        let mask = full_mask(1, 4, 4);
        let nfeat = Method::Stats.feature_names(WinSpec::Win(3)).len();
        let mut sink = Array4::from_elem((1, 4, 4, nfeat), f32::NAN);
        let cfg = TextureConfig {
            sink: Some(sink.view_mut()),
            ..Default::default()
        };
        let (tmap, names) = texture_map(
            img.view(),
            Method::Stats,
            WinSpec::Win(3),
            Some(&mask),
            cfg,
        )
        .unwrap();
        // 结果在外部数组中, 不返回内部特征图.
        assert!(tmap.is_none());
        assert_eq!(names.len(), nfeat);
        assert!(float_eq(sink[(0, 1, 1, 0)], 1.0));
        assert!(float_eq(sink[(0, 0, 0, 0)], 0.0));
    }

    #[test]
    fn test_sink_shape_mismatch_fails() {
        let img = ones(1, 4, 4);
        let mask = full_mask(1, 4, 4);
        let mut sink = Array4::from_elem((1, 4, 4, 3), f32::NAN);
        let cfg = TextureConfig {
            sink: Some(sink.view_mut()),
            ..Default::default()
        };
        let r = texture_map(
            img.view(),
            Method::Stats,
            WinSpec::Win(3),
            Some(&mask),
            cfg,
        );
        assert!(matches!(r, Err(TextureError::SinkShape(_, _))));
    }

    #[test]
    fn test_parse_method_and_winspec() {
        for method in Method::ALL {
            assert_eq!(method.name().parse::<Method>().unwrap(), method);
        }
        assert_eq!(
            "nope".parse::<Method>().unwrap_err(),
            TextureError::UnknownMethod("nope".into())
        );

        assert_eq!("5".parse::<WinSpec>().unwrap(), WinSpec::Win(5));
        assert_eq!("mbb".parse::<WinSpec>().unwrap(), WinSpec::Mbb);
        assert_eq!("all".parse::<WinSpec>().unwrap(), WinSpec::All);
        assert!(matches!(
            "0".parse::<WinSpec>(),
            Err(TextureError::BadWinSpec(_))
        ));
        assert!(matches!(
            "x".parse::<WinSpec>(),
            Err(TextureError::BadWinSpec(_))
        ));
    }
}
