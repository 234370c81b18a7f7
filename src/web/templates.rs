//! Embedded HTML templates for the callback status page.
//!
//! Template names end in `.html` so minijinja auto-escapes every value.

/// Base layout. The status page extends this.
pub const LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="ko">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{% block title %}WeHand{% endblock %}</title>
    <style>
        :root {
            --bg: #f7f9fb;
            --card: #ffffff;
            --text: #1f2937;
            --muted: #6b7280;
            --brand: #16a34a;
            --danger: #dc2626;
            --radius: 16px;
        }
        *, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Apple SD Gothic Neo', 'Noto Sans KR', sans-serif;
            background: var(--bg);
            color: var(--text);
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            padding: 1rem;
        }
        .card {
            background: var(--card);
            border-radius: var(--radius);
            box-shadow: 0 4px 24px rgba(0,0,0,0.06);
            width: 100%;
            max-width: 380px;
            padding: 2.5rem 1.5rem;
            text-align: center;
        }
        .icon { font-size: 2.5rem; margin-bottom: 0.75rem; }
        .icon.success { color: var(--brand); }
        .icon.error { color: var(--danger); }
        h2 { font-size: 1.25rem; font-weight: 700; }
        .muted { color: var(--muted); font-size: 0.875rem; margin-top: 0.5rem; }
        .spinner {
            width: 40px; height: 40px; margin: 0 auto 1rem;
            border: 4px solid #e5e7eb; border-top-color: var(--brand);
            border-radius: 50%; animation: spin 0.8s linear infinite;
        }
        @keyframes spin { to { transform: rotate(360deg); } }
    </style>
</head>
<body>
{% block body %}{% endblock %}
</body>
</html>
"#;

/// Callback status page: loading, success or error.
pub const CALLBACK: &str = r#"{% extends "layout.html" %}
{% block title %}{{ provider_label }} 로그인 - WeHand{% endblock %}
{% block body %}
<div class="card" data-status="{{ status }}">
    {% if status == "loading" %}
    <div class="spinner"></div>
    <h2>{{ provider_label }} 로그인 처리 중...</h2>
    <p class="muted">잠시만 기다려주세요.</p>
    {% elif status == "success" %}
    <div class="icon success">&#10003;</div>
    <h2>로그인 성공!</h2>
    <p class="muted">잠시 후 이동합니다.</p>
    {% else %}
    <div class="icon error">&#10007;</div>
    <h2>로그인 실패</h2>
    <p class="muted">{{ message }}</p>
    <p class="muted">회원가입 페이지로 이동합니다.</p>
    {% endif %}
</div>
{% endblock %}
"#;
