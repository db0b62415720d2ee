//! 基础设施层
//!
//! 提供生成器所依赖的外部协作者抽象：
//! - 服务容器与插件管理器

pub mod container;

pub use container::{
    Container, ContainerEntry, PluginRegistryConvention, ServiceManagerContainer,
    SuffixConvention,
};
