//! Line prompts on the terminal

use anyhow::{Result, bail};
use std::io::{BufRead, Write};

/// Ask until a non-blank answer is given
pub fn ask_non_empty<R, W>(question: &str, input: &mut R, out: &mut W) -> Result<String>
where
    R: BufRead,
    W: Write,
{
    let mut line = String::new();
    loop {
        write!(out, "{}", question)?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            bail!("no answer given to \"{}\"", question.trim_end_matches([':', ' ']));
        }
        let answer = line.trim();
        if !answer.is_empty() {
            return Ok(answer.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_blank_answers_are_skipped() {
        let mut input = Cursor::new(b"\n  \nweb01\n".to_vec());
        let mut out = Vec::new();
        let answer = ask_non_empty("Please enter a server name: ", &mut input, &mut out).unwrap();
        assert_eq!(answer, "web01");
        assert_eq!(
            String::from_utf8(out).unwrap().matches("Please enter a server name: ").count(),
            3
        );
    }

    #[test]
    fn test_end_of_input_fails() {
        let mut input = Cursor::new(Vec::new());
        let mut out = Vec::new();
        let err = ask_non_empty("Enter your Cloud password: ", &mut input, &mut out).unwrap_err();
        assert!(err.to_string().contains("Enter your Cloud password"));
    }
}
