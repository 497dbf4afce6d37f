//! Command-line tokenizer.

/// Splits a command line into tokens, shell style.
///
/// - Whitespace separates tokens.
/// - Single quotes group text literally.
/// - Double quotes group text; inside them a backslash escapes the next
///   character.
/// - An empty quoted string (`""` or `''`) is a token of its own.
pub fn shell_split(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // a quote pair was seen in the current token, even if empty
    let mut quoted = false;
    let mut single = false;
    let mut double = false;
    let mut escaped = false;

    for ch in input.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' if double => escaped = true,
            '\'' if !double => {
                single = !single;
                quoted = true;
            }
            '"' if !single => {
                double = !double;
                quoted = true;
            }
            c if c.is_whitespace() && !single && !double => {
                if quoted || !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }

    if quoted || !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_words() {
        assert_eq!(shell_split("ban  someone\t7"), ["ban", "someone", "7"]);
    }

    #[test]
    fn test_quotes() {
        assert_eq!(
            shell_split(r#"say "hello there" 'and you'"#),
            ["say", "hello there", "and you"]
        );
        assert_eq!(
            shell_split(r#"note "it's" 'a "quote"'"#),
            ["note", "it's", r#"a "quote""#]
        );
    }

    #[test]
    fn test_escapes_inside_double_quotes() {
        assert_eq!(shell_split(r#"echo "a \"b\" c""#), ["echo", r#"a "b" c"#]);
        assert_eq!(shell_split(r"echo a\b"), ["echo", r"a\b"]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(shell_split("").is_empty());
        assert!(shell_split(" \n\t ").is_empty());
        assert_eq!(shell_split(r#"set name """#), ["set", "name", ""]);
    }
}
