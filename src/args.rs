//! Allow-list validation of caller supplied yt-dlp flags.

use std::collections::BTreeMap;

use regex::Regex;

use crate::error::{AppError, Result};
use crate::logger::Logger;
use crate::models::FlagSpec;

/// A flag spec with its pattern compiled
#[derive(Debug, Clone)]
struct CompiledSpec {
    arity: usize,
    choices: Option<Vec<String>>,
    pattern: Option<Regex>,
}

/// Immutable allow-list built once at startup
#[derive(Debug, Clone)]
pub struct AllowList {
    specs: BTreeMap<String, CompiledSpec>,
}

impl AllowList {
    /// Compiles the configured flag specs. Patterns are anchored so they must match the whole value.
    pub fn compile(specs: &BTreeMap<String, FlagSpec>) -> Result<Self> {
        let mut compiled = BTreeMap::new();
        for (flag, spec) in specs {
            let pattern = match &spec.pattern {
                Some(p) => Some(Regex::new(&format!("^(?:{})$", p))?),
                None => None,
            };
            compiled.insert(
                flag.clone(),
                CompiledSpec { arity: spec.arity, choices: spec.choices.clone(), pattern },
            );
        }
        Ok(Self { specs: compiled })
    }

    /// Number of values `flag` consumes, `None` when it is not allow-listed
    pub fn arity(&self, flag: &str) -> Option<usize> {
        self.specs.get(flag).map(|spec| spec.arity)
    }
}

/// One accepted flag with its values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFlag {
    pub name: String,
    pub values: Vec<String>,
}

/// Flags that passed the allow-list, in the order the caller gave them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizedArgs {
    flags: Vec<ParsedFlag>,
}

impl SanitizedArgs {
    pub fn contains(&self, name: &str) -> bool {
        self.flags.iter().any(|f| f.name == name)
    }

    /// First value of the last occurrence of `name`. yt-dlp lets a repeated
    /// flag override earlier ones, so the last occurrence is the one in effect.
    pub fn last_value_of(&self, name: &str) -> Option<&str> {
        self.flags
            .iter()
            .rev()
            .find(|f| f.name == name)
            .and_then(|f| f.values.first())
            .map(String::as_str)
    }

    pub fn flags(&self) -> &[ParsedFlag] {
        &self.flags
    }

    /// Flattens back into a token list
    pub fn to_tokens(&self) -> Vec<String> {
        self.flags
            .iter()
            .flat_map(|f| std::iter::once(f.name.clone()).chain(f.values.iter().cloned()))
            .collect()
    }
}

pub struct ArgumentValidator;

impl ArgumentValidator {
    pub fn validate(args: &[String], allow_list: &AllowList) -> Result<SanitizedArgs> {
        Self::validate_with_logger(args, allow_list, None)
    }

    /// Scans `args` left to right, consuming each flag's values. Fails on the first bad token.
    pub fn validate_with_logger(
        args: &[String],
        allow_list: &AllowList,
        logger: Option<&Logger>,
    ) -> Result<SanitizedArgs> {
        if let Some(logger) = logger {
            logger.log_debug(&format!("Validating arguments ({}): {:?}", args.len(), args));
        }

        let mut sanitized = SanitizedArgs::default();
        let mut i = 0;

        while i < args.len() {
            let flag = &args[i];
            let spec = allow_list
                .specs
                .get(flag)
                .ok_or_else(|| AppError::InvalidFlag(flag.clone()))?;

            let remaining = args.len() - i - 1;
            if remaining < spec.arity {
                return Err(AppError::MissingValue {
                    flag: flag.clone(),
                    expected: spec.arity,
                    found: remaining,
                });
            }

            let values = &args[i + 1..i + 1 + spec.arity];
            for value in values {
                Self::check_value(flag, value, spec)?;
            }

            if let Some(logger) = logger {
                logger.log_debug(&format!("Keeping allowed arg: {} {:?}", flag, values));
            }
            sanitized.flags.push(ParsedFlag { name: flag.clone(), values: values.to_vec() });

            i += 1 + spec.arity;
        }

        Ok(sanitized)
    }

    fn check_value(flag: &str, value: &str, spec: &CompiledSpec) -> Result<()> {
        if let Some(choices) = &spec.choices {
            if !choices.iter().any(|c| c == value) {
                return Err(AppError::InvalidChoice {
                    flag: flag.to_string(),
                    value: value.to_string(),
                    choices: choices.clone(),
                });
            }
        } else if let Some(pattern) = &spec.pattern {
            if !pattern.is_match(value) {
                return Err(AppError::InvalidFormat { flag: flag.to_string(), value: value.to_string() });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_allowed_args;

    fn allow_list() -> AllowList {
        AllowList::compile(&default_allowed_args()).unwrap()
    }

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn accepts_allowed_flags_in_order() {
        let args = strings(&["--audio-format", "mp3", "--audio-quality", "0"]);
        let sanitized = ArgumentValidator::validate(&args, &allow_list()).unwrap();
        assert_eq!(sanitized.to_tokens(), args);
        assert_eq!(sanitized.last_value_of("--audio-format"), Some("mp3"));
    }

    #[test]
    fn keeps_relative_order_of_mixed_flags() {
        let args = strings(&[
            "--embed-metadata",
            "--convert-thumbnails",
            "jpg",
            "--embed-thumbnail",
            "--audio-format",
            "opus",
        ]);
        let sanitized = ArgumentValidator::validate(&args, &allow_list()).unwrap();
        let names: Vec<&str> = sanitized.flags().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["--embed-metadata", "--convert-thumbnails", "--embed-thumbnail", "--audio-format"]
        );
        assert_eq!(sanitized.to_tokens(), args);
    }

    #[test]
    fn empty_input_is_valid() {
        let sanitized = ArgumentValidator::validate(&[], &allow_list()).unwrap();
        assert_eq!(sanitized, SanitizedArgs::default());
    }

    #[test]
    fn repeated_flag_keeps_every_occurrence_and_last_value_wins() {
        let args = strings(&["--audio-format", "mp3", "--embed-metadata", "--audio-format", "flac"]);
        let sanitized = ArgumentValidator::validate(&args, &allow_list()).unwrap();
        assert_eq!(sanitized.to_tokens(), args);
        assert_eq!(sanitized.last_value_of("--audio-format"), Some("flac"));
        assert_eq!(sanitized.last_value_of("--embed-metadata"), None);
        assert_eq!(sanitized.last_value_of("--audio-quality"), None);
    }

    #[test]
    fn arity_lookup() {
        let list = allow_list();
        assert_eq!(list.arity("--audio-format"), Some(1));
        assert_eq!(list.arity("--embed-thumbnail"), Some(0));
        assert_eq!(list.arity("-o"), None);
    }

    #[test]
    fn rejects_unknown_flag() {
        let args = strings(&["--audio-format", "mp3", "--exec", "rm -rf /"]);
        match ArgumentValidator::validate(&args, &allow_list()) {
            Err(AppError::InvalidFlag(flag)) => assert_eq!(flag, "--exec"),
            other => panic!("expected InvalidFlag, got {:?}", other),
        }
    }

    #[test]
    fn stray_value_is_treated_as_flag() {
        let args = strings(&["--embed-thumbnail", "yes"]);
        assert!(matches!(
            ArgumentValidator::validate(&args, &allow_list()),
            Err(AppError::InvalidFlag(flag)) if flag == "yes"
        ));
    }

    #[test]
    fn rejects_missing_value() {
        let args = strings(&["--audio-format"]);
        assert!(matches!(
            ArgumentValidator::validate(&args, &allow_list()),
            Err(AppError::MissingValue { expected: 1, found: 0, .. })
        ));
    }

    #[test]
    fn rejects_value_outside_choices() {
        let args = strings(&["--audio-format", "exe"]);
        assert!(matches!(
            ArgumentValidator::validate(&args, &allow_list()),
            Err(AppError::InvalidChoice { value, .. }) if value == "exe"
        ));
    }

    #[test]
    fn audio_quality_must_be_zero_to_ten() {
        let list = allow_list();
        for ok in ["0", "5", "9", "10"] {
            let args = strings(&["--audio-quality", ok]);
            assert!(ArgumentValidator::validate(&args, &list).is_ok(), "{} should pass", ok);
        }
        for bad in ["15", "-1", "01", "100", "5 ", "128K", ""] {
            let args = strings(&["--audio-quality", bad]);
            assert!(
                matches!(ArgumentValidator::validate(&args, &list), Err(AppError::InvalidFormat { .. })),
                "{:?} should fail",
                bad
            );
        }
    }

    #[test]
    fn choices_take_precedence_over_pattern() {
        let mut specs = BTreeMap::new();
        specs.insert(
            "--x".to_string(),
            FlagSpec { arity: 1, choices: Some(vec!["a".into()]), pattern: Some("b".into()) },
        );
        let list = AllowList::compile(&specs).unwrap();
        assert!(ArgumentValidator::validate(&strings(&["--x", "a"]), &list).is_ok());
        assert!(matches!(
            ArgumentValidator::validate(&strings(&["--x", "b"]), &list),
            Err(AppError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn unconstrained_flag_accepts_any_value() {
        let mut specs = BTreeMap::new();
        specs.insert("--user-agent".to_string(), FlagSpec { arity: 1, choices: None, pattern: None });
        let list = AllowList::compile(&specs).unwrap();
        let sanitized = ArgumentValidator::validate(&strings(&["--user-agent", "curl/8"]), &list).unwrap();
        assert_eq!(sanitized.last_value_of("--user-agent"), Some("curl/8"));
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let mut specs = BTreeMap::new();
        specs.insert("--x".to_string(), FlagSpec::pattern("("));
        assert!(matches!(AllowList::compile(&specs), Err(AppError::Config(_))));
    }
}
