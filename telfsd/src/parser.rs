//! Command line grammar: `<verb>[ <args>]`.
//!
//! Arguments are either bare runs or double-quoted runs (which may contain
//! spaces). Characters that cannot start or continue a token are skipped.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb { Help, Ls, Cd, Touch, Mkdir, Rm, Cat, Copy }

impl Verb {
    pub fn parse(word: &str) -> Option<Verb> {
        match word {
            "--help" => Some(Verb::Help),
            "ls" => Some(Verb::Ls),
            "cd" => Some(Verb::Cd),
            "touch" => Some(Verb::Touch),
            "mkdir" => Some(Verb::Mkdir),
            "rm" => Some(Verb::Rm),
            "cat" => Some(Verb::Cat),
            "copy" => Some(Verb::Copy),
            _ => None,
        }
    }

    /// Exact number of arguments the verb accepts.
    pub fn arity(self) -> usize {
        match self {
            Verb::Help | Verb::Ls => 0,
            Verb::Cd | Verb::Touch | Verb::Mkdir | Verb::Rm | Verb::Cat => 1,
            Verb::Copy => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Help => "--help",
            Verb::Ls => "ls",
            Verb::Cd => "cd",
            Verb::Touch => "touch",
            Verb::Mkdir => "mkdir",
            Verb::Rm => "rm",
            Verb::Cat => "cat",
            Verb::Copy => "copy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: Verb,
    pub args: Vec<String>,
}

/// Parses one input line. `None` for blank lines and unknown verbs.
pub fn parse_line(raw: &str) -> Option<Command> {
    let line = raw.replace(|c: char| c == '\r' || c == '\n', "");
    let (word, rest) = match line.split_once(' ') {
        Some((word, rest)) => (word, rest),
        None => (line.as_str(), ""),
    };
    let verb = Verb::parse(word)?;
    Some(Command { verb, args: tokenize(rest) })
}

// Never part of a token, quoted or not.
fn is_reserved(c: char) -> bool {
    matches!(c, '\\' | ':' | '*' | '?' | '<' | '>' | '|' | '"')
}

fn is_bare(c: char) -> bool {
    c != ' ' && !is_reserved(c)
}

fn is_quoted(c: char) -> bool {
    !is_reserved(c)
}

/// Splits the argument part of a line into tokens, leftmost match first.
pub fn tokenize(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if is_bare(c) {
            let start = i;
            while i < chars.len() && is_bare(chars[i]) {
                i += 1;
            }
            tokens.push(chars[start..i].iter().collect());
        } else if c == '"' {
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && is_quoted(chars[end]) {
                end += 1;
            }
            if end > start && end < chars.len() && chars[end] == '"' {
                tokens.push(chars[start..end].iter().collect());
                i = end + 1;
            } else {
                // stray quote
                i += 1;
            }
        } else {
            i += 1;
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_tokens() {
        assert_eq!(tokenize("a b  c"), vec!["a", "b", "c"]);
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn quoted_token_keeps_spaces() {
        assert_eq!(tokenize("\"my file.txt\" dst"), vec!["my file.txt", "dst"]);
        assert_eq!(tokenize("src \"dst dir\""), vec!["src", "dst dir"]);
    }

    #[test]
    fn reserved_chars_split_and_vanish() {
        assert_eq!(tokenize("a:b*c"), vec!["a", "b", "c"]);
        assert_eq!(tokenize("x\\y"), vec!["x", "y"]);
        assert_eq!(tokenize("<>|?"), Vec::<String>::new());
    }

    #[test]
    fn stray_quotes_are_skipped() {
        assert_eq!(tokenize("\"abc"), vec!["abc"]);
        assert_eq!(tokenize("\"\" abc"), vec!["abc"]);
        assert_eq!(tokenize("ab\"cd"), vec!["ab", "cd"]);
    }

    #[test]
    fn quoted_run_stops_at_reserved_char() {
        // the quoted alternative fails at ':' so the scan resumes after the quote
        assert_eq!(tokenize("\"a:b\""), vec!["a", "b"]);
    }

    #[test]
    fn verb_without_separator_has_no_args() {
        assert_eq!(parse_line("cd"), Some(Command { verb: Verb::Cd, args: vec![] }));
        assert_eq!(parse_line("ls\r\n"), Some(Command { verb: Verb::Ls, args: vec![] }));
    }

    #[test]
    fn args_follow_first_space() {
        let cmd = parse_line("copy a \"b c\"").unwrap();
        assert_eq!(cmd.verb, Verb::Copy);
        assert_eq!(cmd.args, vec!["a", "b c"]);
    }

    #[test]
    fn unknown_and_blank_lines() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("dir"), None);
        assert_eq!(parse_line(" ls"), None);
        assert_eq!(parse_line("LS"), None);
    }
}
