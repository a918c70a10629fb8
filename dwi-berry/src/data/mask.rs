use std::fmt::Write as _;
use std::path::Path;

use itertools::izip;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};

use crate::{Idx2d, Idx3d};

/// 3D 布尔选区掩码. 被选中的体素为 `true`.
///
/// 掩码与参数图配对使用, 二者形状必须完全一致; 形状检查由
/// 使用方 (如纹理层入口) 负责.
#[derive(Debug, Clone)]
pub struct Mask3d {
    data: Array3<bool>,
}

impl Mask3d {
    /// 由裸布尔数组直接创建. `data` 按照 `(z, H, W)` 组织.
    #[inline]
    pub fn new(data: Array3<bool>) -> Self {
        Self { data }
    }

    /// 获取掩码形状 `(z, H, W)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获取水平切片个数.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, bool> {
        self.data.view()
    }

    /// 获取 z 空间第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ArrayView2<'_, bool> {
        self.data.index_axis(Axis(0), z_index)
    }

    /// 获取能按升序迭代水平切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = ArrayView2<'_, bool>> {
        self.data.axis_iter(Axis(0))
    }

    /// 获取被选中的体素总数.
    #[inline]
    pub fn n_selected(&self) -> usize {
        self.data.iter().filter(|p| **p).count()
    }

    /// 获取第 `z_index` 层被选中的体素个数.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn n_selected_slice(&self, z_index: usize) -> usize {
        self.slice_at(z_index).iter().filter(|p| **p).count()
    }

    /// 获取存在选中体素的切片索引, 按升序存储.
    pub fn selected_slices(&self) -> Vec<usize> {
        self.slice_iter()
            .enumerate()
            .filter_map(|(i, s)| s.iter().any(|&b| b).then_some(i))
            .collect()
    }

    /// 按行优先序收集 `img` 中所有被选中的体素值.
    ///
    /// 如果 `img` 与掩码形状不一致, 则程序 panic.
    pub fn selected(&self, img: ArrayView3<f32>) -> Vec<f32> {
        assert_eq!(img.dim(), self.shape(), "参数图与掩码形状不一致");
        izip!(img.iter(), self.data.iter())
            .filter_map(|(&v, &sel)| sel.then_some(v))
            .collect()
    }

    /// 获取包含所有选中体素的最小包围盒, 每维为半开区间 `(起, 止)`.
    ///
    /// 如果掩码没有选中任何体素, 则返回 `None`.
    pub fn bounding_box(&self) -> Option<[(usize, usize); 3]> {
        let mut lo = [usize::MAX; 3];
        let mut hi = [0usize; 3];
        let mut any = false;
        for ((z, h, w), &sel) in self.data.indexed_iter() {
            if sel {
                any = true;
                for (l, u, c) in izip!(&mut lo, &mut hi, [z, h, w]) {
                    *l = (*l).min(c);
                    *u = (*u).max(c + 1);
                }
            }
        }
        any.then(|| [(lo[0], hi[0]), (lo[1], hi[1]), (lo[2], hi[2])])
    }
}

/// 获取 2D 布尔切片中所有选中像素的最小包围盒, 每维为半开区间 `(起, 止)`.
///
/// 如果切片没有选中任何像素, 则返回 `None`.
pub fn bounding_box_2d(mask: ArrayView2<bool>) -> Option<[(usize, usize); 2]> {
    let mut lo = [usize::MAX; 2];
    let mut hi = [0usize; 2];
    let mut any = false;
    for ((h, w), &sel) in mask.indexed_iter() {
        if sel {
            any = true;
            for (l, u, c) in izip!(&mut lo, &mut hi, [h, w]) {
                *l = (*l).min(c);
                *u = (*u).max(c + 1);
            }
        }
    }
    any.then(|| [(lo[0], hi[0]), (lo[1], hi[1])])
}

/// 旧式 ASCII 掩码文件的读写错误.
#[derive(Debug)]
pub enum MaskError {
    /// 文件 I/O 错误.
    Io(std::io::Error),

    /// 缺少 `slice: N` 头部行.
    MissingHeader,

    /// 切片索引无法解析, 或不是从 1 开始的正整数.
    BadSliceIndex(String),

    /// 像素行中出现了 `0`/`1` 之外的字符.
    BadPixel(char),

    /// 像素行长度不一致. 参数依次为行号 (从 1 开始)、期望长度、实际长度.
    RaggedRow(usize, usize, usize),

    /// 文件中没有任何像素行.
    Empty,
}

impl From<std::io::Error> for MaskError {
    #[inline]
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// 单切片 2D 掩码, 来自旧式 ASCII 掩码文件.
///
/// 旧式掩码文件只描述一张切片: 头部行 `slice: N` 给出该切片的
/// **从 1 开始** 的索引, 之后每行是一串 `0`/`1` 字符, 按行优先描述
/// 选区. 如有可能, 应使用 [`SliceMask::into_3d`] 将其提升为
/// [`Mask3d`] 后再参与计算.
#[derive(Debug, Clone)]
pub struct SliceMask {
    /// 切片索引, 从 1 开始.
    slice: usize,
    data: Array2<bool>,
}

impl SliceMask {
    /// 由切片索引 (从 1 开始) 和 2D 布尔数组直接创建.
    ///
    /// 当 `slice` 为 0 时 panic.
    pub fn new(slice: usize, data: Array2<bool>) -> Self {
        assert_ne!(slice, 0, "旧式掩码的切片索引从 1 开始");
        Self { slice, data }
    }

    /// 切片索引, 从 1 开始.
    #[inline]
    pub fn slice(&self) -> usize {
        self.slice
    }

    /// 获取掩码切片形状 `(H, W)`.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 获取被选中的像素个数.
    #[inline]
    pub fn n_selected(&self) -> usize {
        self.data.iter().filter(|p| **p).count()
    }

    /// 解析 ASCII 掩码文本.
    pub fn parse(text: &str) -> Result<Self, MaskError> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let header = lines.next().ok_or(MaskError::MissingHeader)?;
        let raw = header
            .strip_prefix("slice:")
            .ok_or(MaskError::MissingHeader)?
            .trim();
        let slice: usize = raw
            .parse()
            .ok()
            .filter(|s| *s >= 1)
            .ok_or_else(|| MaskError::BadSliceIndex(raw.to_owned()))?;

        let mut rows: Vec<Vec<bool>> = Vec::new();
        for (lineno, line) in lines.enumerate() {
            let line = line.trim();
            let mut row = Vec::with_capacity(line.len());
            for ch in line.chars() {
                match ch {
                    '0' => row.push(false),
                    '1' => row.push(true),
                    other => return Err(MaskError::BadPixel(other)),
                }
            }
            if let Some(first) = rows.first() {
                if first.len() != row.len() {
                    return Err(MaskError::RaggedRow(lineno + 1, first.len(), row.len()));
                }
            }
            rows.push(row);
        }
        if rows.is_empty() || rows[0].is_empty() {
            return Err(MaskError::Empty);
        }

        let (h, w) = (rows.len(), rows[0].len());
        let flat: Vec<bool> = rows.into_iter().flatten().collect();
        // 行长度一致性已在上面检查过, 这里不会产生 Err.
        let data = Array2::from_shape_vec((h, w), flat).unwrap();
        Ok(Self { slice, data })
    }

    /// 打开旧式 ASCII 掩码文件. `path` 为文件的本地路径.
    /// 如果打开或解析失败, 则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MaskError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&text)
    }

    /// 将掩码按旧式 ASCII 格式写入 `path`.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), MaskError> {
        let (h, w) = self.shape();
        let mut text = format!("slice: {}\n", self.slice);
        for i in 0..h {
            for j in 0..w {
                // 向 String 写入不会失败.
                write!(text, "{}", self.data[(i, j)] as u8).unwrap();
            }
            text.push('\n');
        }
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    /// 将 2D 掩码提升为拥有 `n_slices` 张切片的 3D 掩码.
    ///
    /// 如果切片索引超出 `n_slices`, 则返回 `None`.
    pub fn into_3d(self, n_slices: usize) -> Option<Mask3d> {
        if self.slice > n_slices {
            return None;
        }
        let (h, w) = self.shape();
        let mut data = Array3::from_elem((n_slices, h, w), false);
        data.index_axis_mut(Axis(0), self.slice - 1).assign(&self.data);
        Some(Mask3d::new(data))
    }
}
