use std::ops::Index;
use std::path::Path;

use ndarray::{Array3, ArrayView2, ArrayView3, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::{Idx2d, Idx3d};

pub mod mask;
pub mod save;
pub mod swin;
pub mod window;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 将 (W, H, z) 转换成 (z, H, W). 以后均按照该模式访问.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Idx3d {
    // [W, H, z]. 体素个数数组.
    let [_, w, h, z, ..] = h.dim;
    (z as usize, h as usize, w as usize)
}

/// nii 格式 3D DWI 参数图, 包括 header 和参数值. 参数值以 `f32` 保存.
///
/// 一个参数图承载一种成像参数 (如 ADC) 在扫描区域上的取值.
/// 4D nii 文件以末轴为参数轴, 读取时用 [`DwiVolume::open_param`]
/// 选出一种参数, 得到 3D 数据.
#[derive(Debug, Clone)]
pub struct DwiVolume {
    header: BoxedHeader,
    data: Array3<f32>,
}

impl Index<Idx3d> for DwiVolume {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl DwiVolume {
    /// 打开 nii 文件格式的 3D 参数图. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    ///
    /// 如果文件数据不是 3D 的, 则程序 panic.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());

        // [W, H, z] -> [z, H, W].
        // hint: 原第一维向下增长, 原第二维向右增长.
        let data = obj.into_volume().into_ndarray::<f32>()?;
        assert_eq!(data.ndim(), 3, "期望 3D 参数图, 实际为 {}D", data.ndim());
        let data = data.permuted_axes([2, 1, 0].as_slice());

        // The nature of nifti data field layout.
        debug_assert!(data.is_standard_layout());

        // 该操作不会生成 `Err`, 可直接 unwrap.
        let data =
            Array3::<f32>::from_shape_vec(get_shape_from_header(&header), data.into_raw_vec())
                .unwrap();

        Ok(Self { header, data })
    }

    /// 打开 nii 文件格式的 4D 参数图, 并选出第 `param` 个参数对应的
    /// 3D 数据. 参数轴为 nii 文件的末轴.
    ///
    /// 如果文件数据不是 4D 的, 或 `param` 越界, 则程序 panic.
    pub fn open_param<P: AsRef<Path>>(path: P, param: usize) -> nifti::Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());

        let data = obj.into_volume().into_ndarray::<f32>()?;
        assert_eq!(data.ndim(), 4, "期望 4D 参数图, 实际为 {}D", data.ndim());
        assert!(
            param < data.shape()[3],
            "参数索引 {param} 越界 (共 {} 个)",
            data.shape()[3]
        );

        // [W, H, z, t] -> 选出参数 -> [z, H, W].
        let sub = data
            .index_axis(Axis(3), param)
            .permuted_axes([2, 1, 0].as_slice());
        // 选取参数轴之后不再是连续布局, 重排为标准布局.
        // 该转换不会生成 `Err`, 可直接 unwrap.
        let data = sub
            .as_standard_layout()
            .into_owned()
            .into_dimensionality::<Ix3>()
            .unwrap();

        Ok(Self { header, data })
    }

    /// 根据裸数据直接创建 `DwiVolume` 实体. `data` 按照 `(z, H, W)` 组织.
    ///
    /// # 注意
    ///
    /// 该方法创建的实体不携带真实扫描几何 (体素分辨率均记为 1 mm),
    /// 因此你应仅将其用于实验目的.
    pub fn from_raw(data: Array3<f32>) -> Self {
        let (z, h, w) = data.dim();
        let mut header = Box::<NiftiHeader>::default();
        header.dim = [3, w as u16, h as u16, z as u16, 1, 1, 1, 1];
        header.pixdim = [1.0; 8];
        header.intent_name[..3].copy_from_slice(b"raw");
        Self { header, data }
    }

    /// 判断该结构是否是由 [`DwiVolume::from_raw`] 手动拼接的.
    #[inline]
    pub fn is_raw(&self) -> bool {
        self.header.intent_name.starts_with(b"raw")
    }

    /// 获取 header 部分.
    #[inline]
    pub fn header(&self) -> &NiftiHeader {
        &self.header
    }

    /// 获取数据形状大小 `(z, H, W)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获取数据水平切片形状大小 `(H, W)`.
    #[inline]
    pub fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 获取水平切片个数.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取单个体素分辨率. 该分辨率以毫米为单位, 分别代表空间
    /// (相邻切片方向), 高 (自然图像的垂直方向), 宽 (自然图像的水平方向).
    #[inline]
    pub fn pix_dim(&self) -> [f64; 3] {
        let [_, w, h, z, ..] = self.header.pixdim;
        [z as f64, h as f64, w as f64]
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    pub fn voxel(&self) -> f64 {
        self.pix_dim().iter().product()
    }

    /// 获取 3D 参数图 z 空间的第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(0), z_index)
    }

    /// 获取能按升序迭代 3D 参数图水平切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = ArrayView2<'_, f32>> {
        self.data.axis_iter(Axis(0))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// 消耗该结构, 取出底层数据.
    #[inline]
    pub fn into_data(self) -> Array3<f32> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::DwiVolume;
    use ndarray::Array3;

    #[test]
    fn test_from_raw() {
        let v = DwiVolume::from_raw(Array3::from_elem((2, 3, 4), 1.5f32));
        assert!(v.is_raw());
        assert_eq!(v.shape(), (2, 3, 4));
        assert_eq!(v.slice_shape(), (3, 4));
        assert_eq!(v.len_z(), 2);
        assert_eq!(v.pix_dim(), [1.0; 3]);
        assert_eq!(v[(1, 2, 3)], 1.5);
        assert_eq!(v.slice_at(0)[(0, 0)], 1.5);
        assert_eq!(v.slice_iter().len(), 2);
    }
}
