// 该文件是 yolov8-trt 项目的一部分。
// src/lib.rs - 库主文件
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

//! 基于 TensorRT 的 YOLOv8 目标检测示例。
//!
//! 流程：读取图像 → 配置推理条件 → 加载模型 → 创建预测器 → 推理 →
//! 绘制检测框并保存 → 记录检测结果。

pub mod args;
pub mod input;
pub mod model;
pub mod output;
pub mod task;

/// 固定输入图像路径
pub const DEFAULT_IMAGE_PATH: &str = "/home/images/group.jpg";
/// 固定模型文件路径
pub const DEFAULT_MODEL_PATH: &str = "/home/model/yolov8s.engine";
/// 固定输出目录
pub const DEFAULT_OUTPUT_DIR: &str = "/home/output";
/// 固定输出文件名
pub const DEFAULT_OUTPUT_NAME: &str = "yolov8_detected.png";
