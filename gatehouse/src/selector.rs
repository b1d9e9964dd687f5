/// Represents ways to locate an element on a page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Select by accessible role and optional accessible name
    Role { role: String, name: Option<String> },
    /// Select by CSS selector
    Css(String),
    /// Select by visible text content
    Text(String),
    /// Select by associated form label
    Label(String),
    /// Select the n-th element from the matches (negative counts from the end)
    Nth(i32),
    /// Chain multiple selectors
    Chain(Vec<Selector>),
    /// Represents an invalid selector string, with a reason
    Invalid(String),
}

impl Selector {
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Selector {
        Selector::Role {
            role: role.into(),
            name: Some(name.into()),
        }
    }

    pub fn link(name: impl Into<String>) -> Selector {
        Selector::role("link", name)
    }

    pub fn button(name: impl Into<String>) -> Selector {
        Selector::role("button", name)
    }

    /// Narrow this selector to the last matching occurrence.
    pub fn last(self) -> Selector {
        match self {
            Selector::Chain(mut parts) => {
                parts.push(Selector::Nth(-1));
                Selector::Chain(parts)
            }
            other => Selector::Chain(vec![other, Selector::Nth(-1)]),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::Role { role, name: Some(name) } => write!(f, "{role}|{name}"),
            Selector::Role { role, name: None } => write!(f, "role:{role}"),
            Selector::Css(css) => write!(f, "css:{css}"),
            Selector::Text(text) => write!(f, "text:{text}"),
            Selector::Label(label) => write!(f, "label:{label}"),
            Selector::Nth(n) => write!(f, "nth:{n}"),
            Selector::Chain(parts) => {
                let joined: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
                write!(f, "{}", joined.join(" >> "))
            }
            Selector::Invalid(reason) => write!(f, "invalid:{reason}"),
        }
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        // Chained selectors first
        let parts: Vec<&str> = s.split(">>").map(|p| p.trim()).collect();
        if parts.len() > 1 {
            return Selector::Chain(parts.into_iter().map(Selector::from).collect());
        }

        // role|name is the preferred precise format
        if s.contains('|') {
            let parts: Vec<&str> = s.splitn(2, '|').collect();
            let role = parts[0].trim().strip_prefix("role:").unwrap_or(parts[0].trim());
            let name = parts[1].trim().strip_prefix("name:").unwrap_or(parts[1].trim());
            return Selector::Role {
                role: role.to_string(),
                name: Some(name.to_string()),
            };
        }

        match s {
            _ if s.starts_with("role:") => Selector::Role {
                role: s[5..].trim().to_string(),
                name: None,
            },
            _ if s.starts_with("css:") => Selector::Css(s[4..].trim().to_string()),
            _ if s.starts_with("text:") => Selector::Text(s[5..].trim().to_string()),
            _ if s.starts_with("label:") => Selector::Label(s[6..].trim().to_string()),
            _ if s.starts_with("nth:") => match s[4..].trim().parse::<i32>() {
                Ok(n) => Selector::Nth(n),
                Err(_) => Selector::Invalid(format!("nth index is not an integer: {s}")),
            },
            // Bare CSS-looking strings are common enough to accept directly
            _ if s.starts_with('#') || s.starts_with('.') => Selector::Css(s.to_string()),
            "" => Selector::Invalid("empty selector".to_string()),
            _ => Selector::Text(s.to_string()),
        }
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Selector::from(s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_name_pipe_format() {
        assert_eq!(
            Selector::from("link|NEIS"),
            Selector::Role {
                role: "link".to_string(),
                name: Some("NEIS".to_string())
            }
        );
        assert_eq!(
            Selector::from("role:button|name:Confirm"),
            Selector::role("button", "Confirm")
        );
    }

    #[test]
    fn chain_with_occurrence() {
        let sel = Selector::from("button|Confirm >> nth:-1");
        assert_eq!(
            sel,
            Selector::Chain(vec![Selector::button("Confirm"), Selector::Nth(-1)])
        );
        assert_eq!(Selector::button("Confirm").last(), sel);
    }

    #[test]
    fn prefixed_forms() {
        assert_eq!(
            Selector::from("css:button.elec-log-btn"),
            Selector::Css("button.elec-log-btn".to_string())
        );
        assert_eq!(Selector::from("label:Keep me signed in"), Selector::Label("Keep me signed in".to_string()));
        assert_eq!(Selector::from("#login"), Selector::Css("#login".to_string()));
        assert!(matches!(Selector::from("nth:x"), Selector::Invalid(_)));
    }

    #[test]
    fn display_round_trips_simple_forms() {
        for raw in ["link|NEIS", "css:.gnb", "text:Sign out", "nth:-1"] {
            let sel = Selector::from(raw);
            assert_eq!(Selector::from(sel.to_string().as_str()), sel);
        }
    }
}
