use thiserror::Error;

const IMAGE_COMMAND: &str = "/image";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Missing URL.")]
    MissingImageUrl,
}

/// One line typed by the teacher, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeacherInput {
    Quit,
    Test,
    /// Anything else is taught to the student.
    Utterance(String),
    /// An image reference, already rewritten into teacher text.
    Image { url: String, text: String },
}

impl TeacherInput {
    /// Classifies a raw line. `QUIT` and `TEST` match case-insensitively after trimming.
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let line = raw.trim();
        if line.eq_ignore_ascii_case("QUIT") {
            return Ok(TeacherInput::Quit);
        }
        if line.eq_ignore_ascii_case("TEST") {
            return Ok(TeacherInput::Test);
        }

        if let Some(rest) = strip_prefix_ignore_case(line, IMAGE_COMMAND) {
            // "/imagery" is an ordinary word, not the command.
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                let url = rest.trim();
                if url.is_empty() {
                    return Err(InputError::MissingImageUrl);
                }
                return Ok(TeacherInput::Image {
                    url: url.to_string(),
                    text: format!("[Image attached: {}]", url),
                });
            }
        }

        Ok(TeacherInput::Utterance(line.to_string()))
    }
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &line[prefix.len()..])
}
