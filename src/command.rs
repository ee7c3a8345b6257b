//! Assembles the yt-dlp command line from sanitized caller flags.

use std::path::Path;

use crate::args::{AllowList, SanitizedArgs};
use crate::constants::flags;
use crate::error::{AppError, Result};
use crate::models::DefaultFlags;

/// True for a token that would let the caller choose where output lands,
/// in separate (`-o`, `--output`) or attached (`-ox`, `--output=x`) form
pub fn is_output_flag(token: &str) -> bool {
    flags::OUTPUT_PATH_LONG
        .iter()
        .any(|long| token == *long || token.starts_with(&format!("{}=", long)))
        || (!token.starts_with("--") && flags::OUTPUT_PATH_SHORT.iter().any(|short| token.starts_with(short)))
}

/// Returns the first output-path flag found in flag position.
///
/// Walks the raw tokens with the allow-list arities so flag values are skipped.
/// An unknown token is stepped over one at a time, it is rejected by validation later.
pub fn find_output_flag<'a>(tokens: &'a [String], allow_list: &AllowList) -> Option<&'a str> {
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        if is_output_flag(token) {
            return Some(token);
        }
        i += 1 + allow_list.arity(token).unwrap_or(0);
    }
    None
}

/// Fails with `ForbiddenFlag` if the caller tries to control the output path
pub fn reject_output_flags(tokens: &[String], allow_list: &AllowList) -> Result<()> {
    match find_output_flag(tokens, allow_list) {
        Some(flag) => Err(AppError::ForbiddenFlag(flag.to_string())),
        None => Ok(()),
    }
}

/// Everything the builder needs besides the caller's flags
pub struct CommandContext<'a> {
    pub workdir: &'a Path,
    pub defaults: &'a DefaultFlags,
    /// Path of a cookie file already written into the working directory
    pub cookie_file: Option<&'a Path>,
}

/// Builds the argument vector for yt-dlp (the program name is not included).
///
/// Order: `-x`, caller flags, `-o <workdir>/<template>`, default flags the caller
/// did not set, `--cookies <file>`, then the URL.
pub fn build_command(url: &str, sanitized: &SanitizedArgs, ctx: &CommandContext<'_>) -> Result<Vec<String>> {
    if let Some(flag) = sanitized.flags().iter().find(|f| is_output_flag(&f.name)) {
        return Err(AppError::ForbiddenFlag(flag.name.clone()));
    }
    let sanitized_tokens = sanitized.to_tokens();

    let template = ctx.workdir.join(crate::constants::OUTPUT_TEMPLATE);

    let mut command = Vec::with_capacity(sanitized_tokens.len() + 12);
    command.push(flags::EXTRACT_AUDIO.to_string());
    command.extend(sanitized_tokens);
    command.push(flags::OUTPUT.to_string());
    command.push(template.to_string_lossy().into_owned());

    if !sanitized.contains(flags::USER_AGENT) && !ctx.defaults.user_agent.is_empty() {
        command.push(flags::USER_AGENT.to_string());
        command.push(ctx.defaults.user_agent.clone());
    }
    if !sanitized.contains(flags::EXTRACTOR_ARGS) && !ctx.defaults.extractor_args.is_empty() {
        command.push(flags::EXTRACTOR_ARGS.to_string());
        command.push(ctx.defaults.extractor_args.clone());
    }
    if !sanitized.contains(flags::GEO_BYPASS) && ctx.defaults.geo_bypass {
        command.push(flags::GEO_BYPASS.to_string());
    }

    if let Some(cookie_file) = ctx.cookie_file {
        command.push(flags::COOKIES.to_string());
        command.push(cookie_file.to_string_lossy().into_owned());
    }

    command.push(url.to_string());
    Ok(command)
}

/// Accepts only http(s) URLs, returning the trimmed form
pub fn validate_url(url: &str) -> Result<&str> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url)
    } else {
        Err(AppError::InvalidUrl(url.to_string()))
    }
}
