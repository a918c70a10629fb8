//! 纹理层的配置错误.

use crate::{Idx2d, Idx3d};

/// 纹理特征图计算开始前即可发现的配置错误.
///
/// 此类错误在任何计算开始前返回; 特征函数自身的计算失败会直接
/// panic 并中止整次计算, 不会以该类型表达.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureError {
    /// 方法名不在注册表中. 参数为原始方法名.
    UnknownMethod(String),

    /// 窗口规格字符串既不是正整数也不是模式字面量. 参数为原始字符串.
    BadWinSpec(String),

    /// 方法与窗口规格的计算模式不匹配.
    /// 参数依次为方法名、窗口规格的字符串形式.
    ModeMismatch(&'static str, String),

    /// 参数图与掩码形状不一致. 参数依次为掩码形状、参数图形状.
    ShapeMismatch(Idx3d, Idx3d),

    /// 滑动窗口边长为 0 或超出切片尺寸.
    /// 参数依次为窗口边长、切片形状 `(H, W)`.
    BadWindow(usize, Idx2d),

    /// 外部输出数组形状与期望不符. 参数依次为实际形状、期望形状.
    SinkShape([usize; 4], [usize; 4]),
}
