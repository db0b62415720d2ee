use clap::Parser;
use std::path::PathBuf;

/// modext - 模块扩展脚手架
#[derive(Parser, Debug)]
#[command(name = "modext", version)]
#[command(about = "在独立模块中扩展框架服务：生成子类或克隆工厂，并改写模块配置")]
pub struct Args {
    /// 子命令
    #[command(subcommand)]
    pub command: Command,

    /// 应用根目录（包含 module/ 目录）
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// 配置文件路径（默认查找 <root>/modext.toml）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 按配置路径扩展服务（factories 或 invokables）
    ExtendService {
        /// 配置路径，例如 controllers/factories/VuFind\Controller\SearchController
        path: String,
        /// 目标模块
        module: String,
    },
    /// 为容器中的服务生成子类并注册别名
    ExtendClass {
        /// 服务类名，例如 VuFind\Auth\Database
        class: String,
        /// 目标模块
        module: String,
    },
    /// 查找服务的工厂注册位置
    Locate {
        /// 服务类名
        class: String,
    },
    /// 以 JSON 输出合并后应用配置中的某个路径
    Show {
        /// 配置路径，省略时输出全部配置
        path: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extend_service() {
        let args = Args::parse_from([
            "modext",
            "--root",
            "/srv/vufind",
            "extend-service",
            "controllers/factories/Foo",
            "MyModule",
        ]);
        assert_eq!(args.root, Some(PathBuf::from("/srv/vufind")));
        assert!(!args.verbose);
        assert_eq!(
            args.command,
            Command::ExtendService {
                path: "controllers/factories/Foo".to_string(),
                module: "MyModule".to_string(),
            }
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::parse_from(["modext", "extend-class", "VuFind\\Auth\\Database", "MyModule", "-v"]);
        assert!(args.verbose);
        assert!(matches!(args.command, Command::ExtendClass { ref class, .. } if class == "VuFind\\Auth\\Database"));
    }

    #[test]
    fn test_show_path_is_optional() {
        let args = Args::parse_from(["modext", "show"]);
        assert_eq!(args.command, Command::Show { path: None });
        assert!(Args::try_parse_from(["modext", "extend-service", "only-one-arg"]).is_err());
    }
}
