// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `{{placeholder}}` substitution for outgoing message text.
//!
//! Recognized: `{{name}}`, `{{first_name}}`, `{{chat_id}}`, `{{var.<key>}}`.
//! Unknown placeholders are left untouched; an unset variable renders empty.

use clientping_core::UserContext;

pub fn render(template: &str, ctx: &UserContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = after[..end].trim();
        match resolve(key, ctx) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

fn resolve<'a>(key: &str, ctx: &'a UserContext) -> Option<&'a str> {
    match key {
        "name" => Some(ctx.user_name.as_str()),
        "first_name" => Some(ctx.first_name()),
        "chat_id" => Some(ctx.chat_id.as_str()),
        _ => key
            .strip_prefix("var.")
            .map(|var| ctx.variables.get(var).map(String::as_str).unwrap_or("")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clientping_core::{Channel, InboundChat};

    fn ctx() -> UserContext {
        let msg = InboundChat::new(Channel::Telegram, "42", "hi", "7", "Ada Lovelace");
        let mut ctx = UserContext::new(&msg);
        ctx.variables.insert("plan".into(), "pro".into());
        ctx
    }

    #[test]
    fn substitutes_known_placeholders() {
        let out = render(
            "Hi {{first_name}} ({{name}}, chat {{chat_id}}), plan: {{ var.plan }}",
            &ctx(),
        );
        assert_eq!(out, "Hi Ada (Ada Lovelace, chat 42), plan: pro");
    }

    #[test]
    fn unknown_placeholder_kept_and_missing_var_empty() {
        assert_eq!(render("{{weather}} {{var.none}}!", &ctx()), "{{weather}} !");
    }

    #[test]
    fn unterminated_braces_pass_through() {
        assert_eq!(render("price {{name", &ctx()), "price {{name");
        assert_eq!(render("no placeholders", &ctx()), "no placeholders");
    }
}
