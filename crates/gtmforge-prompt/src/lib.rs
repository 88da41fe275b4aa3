//! Embedded prompt templates and rendering.
//!
//! Templates ship inside the binary. Each one is split into a system part and
//! a user part on the `{# User Prompt #}` marker line; `{{var}}` placeholders
//! are substituted from a JSON object of variables. Rendering fails on an
//! unknown template name or a missing variable, never silently.

use gtmforge_utils::error::PromptError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const USER_PROMPT_MARKER: &str = "{# User Prompt #}";

static VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("valid placeholder regex"));

/// Known template names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateName {
    CompanyOverview,
    TargetAccount,
    TargetPersona,
    ContextAssessment,
}

impl TemplateName {
    /// Parse a template name string.
    ///
    /// # Errors
    ///
    /// Returns `PromptError::UnknownTemplate` for unrecognized names.
    pub fn parse(s: &str) -> Result<Self, PromptError> {
        match s {
            "company_overview" => Ok(Self::CompanyOverview),
            "target_account" => Ok(Self::TargetAccount),
            "target_persona" => Ok(Self::TargetPersona),
            "context_assessment" => Ok(Self::ContextAssessment),
            other => Err(PromptError::UnknownTemplate(other.to_string())),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CompanyOverview => "company_overview",
            Self::TargetAccount => "target_account",
            Self::TargetPersona => "target_persona",
            Self::ContextAssessment => "context_assessment",
        }
    }

    const fn source(&self) -> &'static str {
        match self {
            Self::CompanyOverview => include_str!("../templates/company_overview.md"),
            Self::TargetAccount => include_str!("../templates/target_account.md"),
            Self::TargetPersona => include_str!("../templates/target_persona.md"),
            Self::ContextAssessment => include_str!("../templates/context_assessment.md"),
        }
    }
}

/// A rendered prompt, split into the system and user parts the backends
/// expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: Option<String>,
    pub user: String,
}

/// Render a template by name.
///
/// `vars` must be a JSON object; string values substitute verbatim, other
/// values substitute as compact JSON.
///
/// # Errors
///
/// `PromptError::UnknownTemplate` for an unrecognized name,
/// `PromptError::MissingVariable` when the template references a variable
/// absent from `vars`.
pub fn render(name: &str, vars: &Value) -> Result<RenderedPrompt, PromptError> {
    render_template(TemplateName::parse(name)?, vars)
}

/// Render a known template.
///
/// # Errors
///
/// `PromptError::MissingVariable` when the template references a variable
/// absent from `vars`.
pub fn render_template(
    template: TemplateName,
    vars: &Value,
) -> Result<RenderedPrompt, PromptError> {
    let source = template.source();
    let (system_part, user_part) = match source.split_once(USER_PROMPT_MARKER) {
        Some((system, user)) => (Some(system.trim()), user.trim()),
        None => (None, source.trim()),
    };

    let system = system_part
        .filter(|s| !s.is_empty())
        .map(|s| substitute(template, s, vars))
        .transpose()?;
    let user = substitute(template, user_part, vars)?;

    Ok(RenderedPrompt { system, user })
}

fn substitute(template: TemplateName, text: &str, vars: &Value) -> Result<String, PromptError> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in VAR_PATTERN.captures_iter(text) {
        let whole = caps.get(0).expect("capture 0 always present");
        let var = &caps[1];

        let value = vars.get(var).ok_or_else(|| PromptError::MissingVariable {
            template: template.as_str().to_string(),
            variable: var.to_string(),
        })?;

        out.push_str(&text[last..whole.start()]);
        match value {
            Value::String(s) => out.push_str(s),
            other => out.push_str(&other.to_string()),
        }
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_accepts_known_names() {
        assert_eq!(
            TemplateName::parse("company_overview").unwrap(),
            TemplateName::CompanyOverview
        );
        assert_eq!(
            TemplateName::parse("target_persona").unwrap(),
            TemplateName::TargetPersona
        );
    }

    #[test]
    fn parse_rejects_unknown_names() {
        match TemplateName::parse("positioning_memo") {
            Err(PromptError::UnknownTemplate(name)) => assert_eq!(name, "positioning_memo"),
            other => panic!("expected UnknownTemplate, got {other:?}"),
        }
    }

    #[test]
    fn render_splits_system_and_user() {
        let vars = json!({
            "website_url": "https://acme.example",
            "website_content": "We make anvils."
        });
        let rendered = render("company_overview", &vars).unwrap();

        let system = rendered.system.unwrap();
        assert!(system.contains("go-to-market analyst"));
        assert!(!system.contains(USER_PROMPT_MARKER));
        assert!(rendered.user.contains("https://acme.example"));
        assert!(rendered.user.contains("We make anvils."));
    }

    #[test]
    fn render_fails_on_missing_variable() {
        let vars = json!({"website_url": "https://acme.example"});
        match render("company_overview", &vars) {
            Err(PromptError::MissingVariable { template, variable }) => {
                assert_eq!(template, "company_overview");
                assert_eq!(variable, "website_content");
            }
            other => panic!("expected MissingVariable, got {other:?}"),
        }
    }

    #[test]
    fn non_string_variables_render_as_json() {
        let vars = json!({"context": {"company_name": "Acme"}});
        let rendered = render("context_assessment", &vars).unwrap();
        assert!(rendered.user.contains("{\"company_name\":\"Acme\"}"));
    }

    #[test]
    fn all_templates_render_with_full_vars() {
        let vars = json!({
            "website_url": "https://acme.example",
            "website_content": "content",
            "account_profile_name": "Mid-market manufacturers",
            "company_context": "context",
            "account_context": "context",
            "persona_profile_name": "Head of Ops",
            "hypothesis": "",
            "context": "context"
        });
        for name in [
            "company_overview",
            "target_account",
            "target_persona",
            "context_assessment",
        ] {
            let rendered = render(name, &vars).unwrap();
            assert!(!rendered.user.is_empty(), "empty user prompt for {name}");
        }
    }
}
