//! Explicit form values extracted from a page snapshot
//!
//! A [`Form`] is plain data: the action path, the HTTP method, and the
//! declared fields in document order. Submission happens through the
//! session that produced the owning page (`Session::submit`), which returns
//! a fresh [`crate::Page`] rather than mutating anything in place.

use regex::Regex;
use url::Url;

use crate::error::{HarnessError, Result};

/// HTTP method declared on a form element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMethod {
    /// HTML's default when the `method` attribute is absent.
    #[default]
    Get,
    Post,
}

/// A submittable named-field mapping discovered on a page.
#[derive(Debug, Clone)]
pub struct Form {
    action: String,
    method: FormMethod,
    /// Document-order field list. Order is preserved for serialization but
    /// carries no meaning for lookup.
    fields: Vec<(String, String)>,
    /// URL of the page the form was discovered on, for action resolution.
    page_url: Url,
}

impl Form {
    pub(crate) fn new(
        action: String,
        method: FormMethod,
        fields: Vec<(String, String)>,
        page_url: Url,
    ) -> Self {
        Self {
            action,
            method,
            fields,
            page_url,
        }
    }

    /// The raw `action` attribute as it appeared in markup.
    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn method(&self) -> FormMethod {
        self.method
    }

    /// Assign a value to a declared field. Fails with `UnknownField` when
    /// the form does not declare the field; forging undeclared fields is
    /// done with [`Form::force_set`] and is always an intentional act.
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> Result<()> {
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(HarnessError::UnknownField {
                action: self.action.clone(),
                field: field.to_string(),
            }),
        }
    }

    /// Add or overwrite a field regardless of whether the form declares it.
    /// Used to forge submissions the markup does not offer (e.g. probing
    /// that a hidden control is actually enforced server-side).
    pub fn force_set(&mut self, field: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field.to_string(), value)),
        }
    }

    /// Whether the form declares a field with this name.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    /// Number of declared fields with this name.
    pub fn field_count(&self, field: &str) -> usize {
        self.fields.iter().filter(|(name, _)| name == field).count()
    }

    /// Current value of a field, if declared.
    pub fn value(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// The field pairs in document order, ready for form-urlencoding.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Resolve the action against the URL of the page the form came from.
    /// An empty action targets the page URL itself.
    pub fn resolve_action(&self) -> Result<Url> {
        if self.action.is_empty() {
            return Ok(self.page_url.clone());
        }
        Ok(self.page_url.join(&self.action)?)
    }
}

/// Declarative form selection. All configured conditions must hold
/// (conjunction); an empty predicate matches every form.
#[derive(Debug, Default, Clone)]
pub struct FormPredicate {
    action_equals: Option<String>,
    action_matches: Option<Regex>,
    has_fields: Vec<String>,
}

impl FormPredicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the action attribute to equal this string exactly.
    pub fn action_equals(mut self, action: impl Into<String>) -> Self {
        self.action_equals = Some(action.into());
        self
    }

    /// Require the action attribute to match this pattern.
    pub fn action_matches(mut self, pattern: Regex) -> Self {
        self.action_matches = Some(pattern);
        self
    }

    /// Require the form to declare a field with this name.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.has_fields.push(field.into());
        self
    }

    pub fn matches(&self, form: &Form) -> bool {
        if let Some(expected) = &self.action_equals {
            if form.action() != expected {
                return false;
            }
        }
        if let Some(pattern) = &self.action_matches {
            if !pattern.is_match(form.action()) {
                return false;
            }
        }
        self.has_fields.iter().all(|field| form.has_field(field))
    }

    /// Human-readable rendering for diagnostics on selection failure.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(action) = &self.action_equals {
            parts.push(format!("action == {action:?}"));
        }
        if let Some(pattern) = &self.action_matches {
            parts.push(format!("action ~ /{pattern}/"));
        }
        for field in &self.has_fields {
            parts.push(format!("has field {field:?}"));
        }
        if parts.is_empty() {
            "any form".to_string()
        } else {
            parts.join(" and ")
        }
    }
}
