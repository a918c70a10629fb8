//! 命令行工具: 计算 3D 参数图在给定方法与窗口规格下的纹理特征图.
//!
//! 输入为 nii (3D, 或带参数轴的 4D) 或 npy 格式的参数图, 以及
//! 旧式 ASCII 或 npy 格式的选区掩码; 输出为 npy 格式的特征图,
//! 特征名列表写入同名 txt 文件. 可以额外将某一特征通道的某层切片
//! 导出为灰度 PNG.

use std::path::{Path, PathBuf};

use clap::Parser;
use log::LevelFilter;
use ndarray::{s, Array3};
use ndarray_npy::{read_npy, write_npy};

use dwi_berry::prelude::*;

#[derive(Parser, Debug)]
#[command(author, about, version)]
struct Args {
    /// 输入参数图 (.nii / .nii.gz / .npy)
    #[arg(short, long)]
    input: PathBuf,

    /// 4D nii 输入时选取的参数索引
    #[arg(long)]
    param: Option<usize>,

    /// 选区掩码文件 (旧式 ASCII 或 .npy); 缺省时不计算任何体素
    #[arg(short, long)]
    mask: Option<PathBuf>,

    /// 纹理方法名
    #[arg(long, default_value = "stats")]
    method: String,

    /// 窗口规格: 窗口边长 / "mbb" / "all"
    #[arg(short, long, default_value = "5")]
    winspec: String,

    /// 输出选中体素的平均值而非逐体素特征图
    #[arg(long)]
    average: bool,

    /// 灰度量化下限
    #[arg(long, default_value_t = dwi_berry::consts::ADCM_LOWER)]
    gray_lower: f32,

    /// 灰度量化上限
    #[arg(long, default_value_t = dwi_berry::consts::ADCM_UPPER)]
    gray_upper: f32,

    /// 灰度级数
    #[arg(long, default_value_t = dwi_berry::consts::DEFAULT_GRAY_LEVELS)]
    gray_levels: u16,

    /// 输出特征图 (.npy); 特征名列表写入同名 .txt
    #[arg(short, long, default_value = "texture.npy")]
    output: PathBuf,

    /// 将一张特征切片另存为灰度 PNG
    #[arg(long)]
    vis: Option<PathBuf>,

    /// PNG 导出的特征通道索引
    #[arg(long, default_value_t = 0)]
    vis_feat: usize,

    /// PNG 导出的切片索引
    #[arg(long, default_value_t = 0)]
    vis_slice: usize,

    /// 提高日志详细程度 (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// 按扩展名读取参数图.
fn read_volume(args: &Args) -> Array3<f32> {
    let path = &args.input;
    if path.extension().is_some_and(|e| e == "npy") {
        read_npy(path).expect("无法读取 npy 参数图")
    } else {
        let vol = match args.param {
            Some(p) => DwiVolume::open_param(path, p),
            None => DwiVolume::open(path),
        };
        vol.expect("无法读取 nii 参数图").into_data()
    }
}

/// 按扩展名读取掩码, ASCII 单切片掩码提升为 3D.
fn read_mask(path: &Path, n_slices: usize) -> Mask3d {
    if path.extension().is_some_and(|e| e == "npy") {
        let data: Array3<bool> = read_npy(path).expect("无法读取 npy 掩码");
        Mask3d::new(data)
    } else {
        SliceMask::open(path)
            .expect("无法读取 ASCII 掩码")
            .into_3d(n_slices)
            .expect("掩码切片索引超出参数图范围")
    }
}

fn main() {
    let args = Args::parse();
    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    simple_logger::SimpleLogger::new()
        .with_level(level)
        .init()
        .expect("日志初始化失败");

    let img = read_volume(&args);
    log::info!("参数图形状: {:?}", img.dim());

    let mask = args.mask.as_ref().map(|p| read_mask(p, img.dim().0));
    match &mask {
        Some(m) => log::info!("选中体素: {} / {}", m.n_selected(), img.len()),
        None => log::warn!("未给定掩码, 不会计算任何体素"),
    }

    let method: Method = args.method.parse().expect("未知的纹理方法");
    let winspec: WinSpec = args.winspec.parse().expect("无法解析窗口规格");
    let gray = GrayWindow::new(args.gray_lower, args.gray_upper, args.gray_levels)
        .expect("灰度窗口参数不合法");

    let cfg = TextureConfig {
        average: args.average,
        gray,
        sink: None,
    };
    let (tmap, names) =
        texture_map(img.view(), method, winspec, mask.as_ref(), cfg).expect("纹理配置错误");
    // 未给定外部输出数组, 特征图总在内存中.
    let tmap = tmap.unwrap();
    log::info!("特征图形状: {:?}", tmap.dim());

    write_npy(&args.output, &tmap).expect("无法写出特征图");
    let names_path = args.output.with_extension("txt");
    std::fs::write(&names_path, names.join("\n") + "\n").expect("无法写出特征名列表");
    log::info!("已写出 {} 与 {}", args.output.display(), names_path.display());

    if let Some(vis) = &args.vis {
        let sli = tmap.slice(s![args.vis_slice, .., .., args.vis_feat]);
        // 以该切片的有限值范围构建可视化窗口; 取值恒定或全为 NaN 时退回 [0, 1] 窗口.
        let (mut lo, mut hi) = (f32::INFINITY, f32::NEG_INFINITY);
        for &v in sli.iter().filter(|v| v.is_finite()) {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        let win = GrayWindow::new(lo, hi, 256)
            .unwrap_or_else(|| GrayWindow::new(0.0, 1.0, 256).unwrap());
        save_feat_slice(sli, &win, vis).expect("无法写出 PNG");
        log::info!("已写出 {}", vis.display());
    }
}
