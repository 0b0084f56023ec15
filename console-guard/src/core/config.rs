use serde::{Deserialize, Serialize};
use shared::util::normalize_path;

/// Principal kind served by a namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamespaceKind {
    Operator,
    EndUser,
}

impl NamespaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamespaceKind::Operator => "operator",
            NamespaceKind::EndUser => "end_user",
        }
    }
}

impl std::fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 路径命名空间配置
///
/// Each namespace owns a path prefix and carries its own login path,
/// whitelist, token key and storage file. Nothing here is shared between
/// namespaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceConfig {
    pub kind: NamespaceKind,
    /// Path prefix, e.g. `/operator`
    pub prefix: String,
    pub login_path: String,
    /// Where an authenticated visit to the login page lands
    pub home_path: String,
    /// Replacement target for authenticated navigation to unknown paths
    pub not_found_path: Option<String>,
    /// Paths reachable without authentication
    pub whitelist: Vec<String>,
    /// Key of the persisted session in the key-value store
    pub token_key: String,
    /// File name of the key-value store under `{work_dir}/auth/`
    pub storage_file: String,
}

impl NamespaceConfig {
    /// 运营端默认配置
    pub fn operator() -> Self {
        Self {
            kind: NamespaceKind::Operator,
            prefix: "/operator".into(),
            login_path: "/operator/login".into(),
            home_path: "/operator/home/index".into(),
            not_found_path: Some("/operator/404".into()),
            whitelist: vec![
                "/operator/login".into(),
                "/operator/403".into(),
                "/operator/404".into(),
                "/operator/500".into(),
            ],
            token_key: "operator.token".into(),
            storage_file: "operator_session.json".into(),
        }
    }

    /// 用户端默认配置
    pub fn end_user() -> Self {
        Self {
            kind: NamespaceKind::EndUser,
            prefix: "/enduser".into(),
            login_path: "/enduser/login".into(),
            home_path: "/enduser/index".into(),
            not_found_path: Some("/enduser/404".into()),
            whitelist: vec![
                "/enduser/login".into(),
                "/enduser/register".into(),
                "/enduser/404".into(),
            ],
            token_key: "enduser.token".into(),
            storage_file: "enduser_session.json".into(),
        }
    }

    pub fn with_whitelist<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_not_found_path(mut self, path: Option<&str>) -> Self {
        self.not_found_path = path.map(Into::into);
        self
    }

    /// Whether `path` lies under this namespace's prefix
    pub fn owns(&self, path: &str) -> bool {
        let path = normalize_path(path);
        let prefix = normalize_path(&self.prefix);
        prefix == "/" || path == prefix || path.starts_with(&format!("{}/", prefix))
    }

    pub fn is_login(&self, path: &str) -> bool {
        normalize_path(path) == normalize_path(&self.login_path)
    }

    pub fn is_whitelisted(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.whitelist.iter().any(|p| normalize_path(p) == path)
    }
}

/// 控制台配置 - 路由守卫的所有配置项
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./work_dir | 工作目录 (会话存储) |
/// | API_BASE_URL | http://localhost:8080 | 后端地址 |
/// | REQUEST_TIMEOUT_SECS | 30 | 请求超时(秒) |
/// | MAX_REDIRECTS | 8 | 单次导航最大重定向次数 |
/// | LOG_LEVEL | info | 日志级别 |
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// 工作目录，存储会话文件、日志
    pub work_dir: String,
    /// 后端 API 地址
    pub api_base_url: String,
    /// 请求超时 (秒)
    pub request_timeout_secs: u64,
    /// 单次导航最大重定向次数
    pub max_redirects: usize,
    /// 日志级别
    pub log_level: String,
    pub operator: NamespaceConfig,
    pub end_user: NamespaceConfig,
}

impl GuardConfig {
    /// 从环境变量加载配置
    ///
    /// 未设置或无法解析的变量保留默认值
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(work_dir) = std::env::var("WORK_DIR") {
            config.work_dir = work_dir;
        }
        if let Ok(url) = std::env::var("API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Some(secs) = std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()) {
            config.request_timeout_secs = secs;
        }
        if let Some(max) = std::env::var("MAX_REDIRECTS").ok().and_then(|v| v.parse().ok()) {
            config.max_redirects = max;
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }
        config
    }

    /// 使用自定义工作目录覆盖配置
    ///
    /// 常用于测试场景
    pub fn with_work_dir(mut self, work_dir: impl Into<String>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Session storage directory: `{work_dir}/auth`
    pub fn auth_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("auth")
    }

    /// Client configuration for the backend
    pub fn client_config(&self) -> console_client::ClientConfig {
        console_client::ClientConfig::new(self.api_base_url.clone())
            .with_timeout(self.request_timeout_secs)
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            work_dir: "./work_dir".into(),
            api_base_url: "http://localhost:8080".into(),
            request_timeout_secs: 30,
            max_redirects: 8,
            log_level: "info".into(),
            operator: NamespaceConfig::operator(),
            end_user: NamespaceConfig::end_user(),
        }
    }
}
