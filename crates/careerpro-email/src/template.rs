//! Email templates
//!
//! Small `{{var}}` substitution over subject and body. The template set
//! is built once and owned by the email service; nothing here is global.

use std::collections::HashMap;

use crate::error::EmailError;

/// One registered template
#[derive(Debug, Clone)]
struct Template {
    subject: String,
    body: String,
}

/// A rendered, ready-to-send email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

/// Named template collection with render-time variable substitution
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: HashMap<String, Template>,
}

impl TemplateSet {
    /// An empty template set
    pub fn new() -> Self {
        Self::default()
    }

    /// The templates the product ships with
    pub fn builtin() -> Self {
        let mut set = Self::new();
        set.register(
            "welcome",
            "Welcome to AI Career Pro, {{name}}!",
            "Hi {{name}},\n\nYour account is ready. Start with a free CV review.\n",
        );
        set.register(
            "usage_limit_warning",
            "You've used {{used}} of {{limit}} {{service}} credits",
            "Hi {{name}},\n\nYou have {{remaining}} {{service}} uses left this month. \
             Upgrade to Pro for unlimited access.\n",
        );
        set.register(
            "payment_failed",
            "Action needed: payment failed",
            "Hi {{name}},\n\nYour last payment failed and your plan is past due. \
             Update your payment method to keep your benefits.\n",
        );
        set.register(
            "achievement_unlocked",
            "Achievement unlocked: {{title}}",
            "Hi {{name}},\n\nYou just earned \"{{title}}\" ({{points}} points). Keep going!\n",
        );
        set
    }

    /// Register or replace a template
    pub fn register(
        &mut self,
        name: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) {
        self.templates.insert(
            name.into(),
            Template {
                subject: subject.into(),
                body: body.into(),
            },
        );
    }

    /// Render a template with the given variables.
    ///
    /// Every placeholder must be supplied; a leftover `{{...}}` is an
    /// error rather than a half-rendered email in someone's inbox.
    pub fn render(
        &self,
        name: &str,
        vars: &HashMap<String, String>,
    ) -> Result<RenderedEmail, EmailError> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| EmailError::UnknownTemplate(name.to_string()))?;

        Ok(RenderedEmail {
            subject: substitute(name, &template.subject, vars)?,
            body: substitute(name, &template.body, vars)?,
        })
    }
}

fn substitute(
    template_name: &str,
    text: &str,
    vars: &HashMap<String, String>,
) -> Result<String, EmailError> {
    let mut out = text.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }

    if let Some(start) = out.find("{{") {
        let end = out[start..].find("}}").map(|e| start + e).unwrap_or(out.len());
        return Err(EmailError::MissingVariable {
            template: template_name.to_string(),
            variable: out[start + 2..end].to_string(),
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn renders_subject_and_body() {
        let set = TemplateSet::builtin();
        let rendered = set.render("welcome", &vars(&[("name", "Ada")])).unwrap();

        assert_eq!(rendered.subject, "Welcome to AI Career Pro, Ada!");
        assert!(rendered.body.contains("Hi Ada,"));
    }

    #[test]
    fn unknown_template_is_an_error() {
        let set = TemplateSet::builtin();
        let err = set.render("nope", &HashMap::new()).unwrap_err();
        assert!(matches!(err, EmailError::UnknownTemplate(_)));
    }

    #[test]
    fn missing_variable_is_an_error() {
        let set = TemplateSet::builtin();
        let err = set.render("welcome", &HashMap::new()).unwrap_err();
        match err {
            EmailError::MissingVariable { variable, .. } => assert_eq!(variable, "name"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn repeated_placeholders_all_substitute() {
        let mut set = TemplateSet::new();
        set.register("echo", "{{word}} {{word}}", "{{word}}!");
        let rendered = set.render("echo", &vars(&[("word", "go")])).unwrap();
        assert_eq!(rendered.subject, "go go");
        assert_eq!(rendered.body, "go!");
    }
}
