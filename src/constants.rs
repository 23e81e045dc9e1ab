// Durable storage keys - shared with the legacy JS pages, do not rename.
pub const STUDENT_KEY_STORAGE_KEY: &str = "student_key";
pub const API_BASE_OVERRIDE_STORAGE_KEY: &str = "API_BASE_OVERRIDE";

// Identity
pub const STUDENT_KEY_HEADER: &str = "X-Student-Key";
/// Stored keys of this length or shorter are treated as missing.
pub const MIN_STUDENT_KEY_LEN: usize = 10;
pub const IDENTITY_PATH_PREFIXES: [&str; 3] = ["/suggestions", "/me/", "/push"];

// Endpoint resolution
pub const BACKEND_DEV_PORT: &str = "8000";
pub const DEV_API_BASE: &str = "http://localhost:8000/api";
pub const SAME_ORIGIN_API_BASE: &str = "/api";
pub const LOOPBACK_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

// Notification defaults
pub const DEFAULT_NOTIFICATION_TITLE: &str = "새 답변이 도착했어요";
pub const DEFAULT_NOTIFICATION_BODY: &str = "건의사항에 새로운 답변이 등록되었습니다.";
pub const NOTIFICATION_TAG: &str = "suggestion";
pub const NOTIFICATION_ICON: &str = "/assets/icon.png";
pub const NOTIFICATION_VIBRATE_PATTERN: [u32; 3] = [200, 100, 200];
pub const NOTIFICATION_CLICK_URL: &str = "/me.html";

// Feedback surface
pub const TOAST_VISIBLE_MS: u32 = 2400;
pub const TOAST_FADE_MS: u32 = 250;
pub const DEFAULT_MODAL_TITLE: &str = "완료";
pub const MODAL_SUBTITLE: &str = "확인 후 계속 진행하세요.";
pub const MODAL_CONFIRM_LABEL: &str = "확인";
