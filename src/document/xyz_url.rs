//! XYZ URL token handling
//!
//! Stored XYZ URLs are templates: the access token is kept in its own column and the query
//! parameter carries a literal placeholder instead.

use regex::Regex;

/// Query parameter name and placeholder text used for XYZ access tokens.
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    param: String,
    placeholder: String,
    pattern: Regex,
}

impl TokenPolicy {
    pub fn new(param: &str, placeholder: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"([?&]){}=([^&#]*)", regex::escape(param)))?;
        Ok(Self {
            param: param.to_string(),
            placeholder: placeholder.to_string(),
            pattern,
        })
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Split a raw URL into `(template, token)`. The first token parameter's value is replaced by
    /// the placeholder. A URL without the parameter, or whose value already is the placeholder,
    /// is stored as-is with no token.
    pub fn tokenize(&self, url: &str) -> (String, Option<String>) {
        let Some(captures) = self.pattern.captures(url) else {
            return (url.to_string(), None);
        };
        let (Some(whole), Some(prefix), Some(value)) =
            (captures.get(0), captures.get(1), captures.get(2))
        else {
            return (url.to_string(), None);
        };
        if value.as_str() == self.placeholder {
            return (url.to_string(), None);
        }

        let template = format!(
            "{}{}{}={}{}",
            &url[..whole.start()],
            prefix.as_str(),
            self.param,
            self.placeholder,
            &url[whole.end()..]
        );
        (template, Some(value.as_str().to_string()))
    }

    /// Substitute the stored token into a template. Only applies when the placeholder is present
    /// and a token is stored.
    pub fn resolve(&self, template: &str, token: Option<&str>) -> String {
        match token {
            Some(token) if template.contains(&self.placeholder) => {
                template.replace(&self.placeholder, token)
            }
            _ => template.to_string(),
        }
    }
}
