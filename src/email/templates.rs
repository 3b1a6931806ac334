const BUTTON_STYLE: &str = "display: inline-block; padding: 10px 20px; background: #7a1f2b; color: white; text-decoration: none; border-radius: 4px;";

/// Minimal HTML escaping for values interpolated into mail bodies.
fn esc(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn layout(title: &str, inner: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: Georgia, serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>{title}</h2>
{inner}
</body>
</html>"#
    )
}

pub fn render_welcome(parish: &str, name: &str, base_url: &str) -> String {
    let inner = format!(
        r#"    <p>Hi {name},</p>
    <p>An account has been created for you on the {parish} admin dashboard.</p>
    <p><a href="{base_url}/admin/login" style="{BUTTON_STYLE}">Sign In</a></p>
    <p style="color: #666; font-size: 14px;">If you didn't expect this email, you can ignore it.</p>"#,
        name = esc(name),
        parish = esc(parish),
    );
    layout(&format!("Welcome to {}", esc(parish)), &inner)
}

pub fn render_password_reset(parish: &str, reset_url: &str) -> String {
    let inner = format!(
        r#"    <p>A password reset was requested for your {parish} dashboard account.</p>
    <p><a href="{reset_url}" style="{BUTTON_STYLE}">Reset Password</a></p>
    <p style="color: #666; font-size: 14px;">This link expires in 1 hour. If you didn't request this, you can ignore it.</p>"#,
        parish = esc(parish),
    );
    layout("Password Reset", &inner)
}

pub fn render_submission_received(
    parish: &str,
    kind_label: &str,
    contact_email: Option<&str>,
    review_url: &str,
) -> String {
    let from = contact_email
        .map(|e| format!("<p>Submitted by <a href=\"mailto:{0}\">{0}</a>.</p>", esc(e)))
        .unwrap_or_default();
    let inner = format!(
        r#"    <p>A new <strong>{kind}</strong> request was submitted through the {parish} website.</p>
    {from}
    <p><a href="{review_url}" style="{BUTTON_STYLE}">Review Request</a></p>"#,
        kind = esc(kind_label),
        parish = esc(parish),
    );
    layout(&format!("New {} request", esc(kind_label)), &inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submitter_email_is_escaped() {
        let html = render_submission_received(
            "St. Joseph",
            "Baptism",
            Some("a<b>@x.org"),
            "http://localhost/admin/submissions/1",
        );
        assert!(html.contains("a&lt;b&gt;@x.org"));
        assert!(!html.contains("a<b>@"));
    }

    #[test]
    fn reset_mail_carries_link() {
        let html = render_password_reset("St. Joseph", "http://x/reset?token=abc");
        assert!(html.contains("http://x/reset?token=abc"));
    }
}
