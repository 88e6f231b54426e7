//! 登录流程 - 流程层

use anyhow::Result;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{Credentials, TimeoutPolicy};
use crate::infrastructure::PageDriver;
use crate::sites::{LoginForm, LoginOutcome};

/// 打开登录页；已登录则直接返回，否则提交凭据并重新检查登录标志
pub async fn run_login(
    page: &dyn PageDriver,
    login_url: &str,
    form: &LoginForm,
    credentials: Option<&Credentials>,
    policy: &TimeoutPolicy,
) -> Result<LoginOutcome> {
    info!("打开登录页: {}", login_url);
    page.goto(login_url).await?;
    sleep(policy.login_settle).await;

    if page.is_present(&form.signed_in_marker).await? {
        info!("✓ 会话仍然有效，无需重新登录");
        return Ok(LoginOutcome::AlreadyAuthenticated);
    }

    let Some(credentials) = credentials else {
        warn!("⚠️ 需要登录但没有配置登录凭据，跳过登录");
        return Ok(LoginOutcome::MissingCredentials);
    };

    page.fill(form.username_field, &credentials.username).await?;
    page.fill(form.password_field, &credentials.password).await?;
    page.click(form.submit_button).await?;
    sleep(policy.login_settle).await;

    if page.is_present(&form.signed_in_marker).await? {
        info!("✓ 登录成功");
        Ok(LoginOutcome::Verified)
    } else {
        warn!("⚠️ 已提交登录表单，但未能确认登录状态，继续运行");
        Ok(LoginOutcome::Assumed)
    }
}
