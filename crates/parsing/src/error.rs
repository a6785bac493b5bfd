#[derive(Debug, thiserror::Error)]
pub enum SubprocessError {
    #[error("subprocess failed with status {status}")]
    Failure {
        status: std::process::ExitStatus,
        stdout: String,
        stderr: String,
    },
    #[error("subprocess encountered io error")]
    Io(#[from] std::io::Error),
    #[error("subprocess output was not UTF8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("no extractor produced any pages for this document")]
    NoContent,

    #[error(transparent)]
    Subprocess(#[from] SubprocessError),

    #[error("archive entry could not be read")]
    Archive(#[from] zip::result::ZipError),

    #[error("markup could not be parsed")]
    Markup(#[from] quick_xml::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ParseError {
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::NoContent => "BOOK_PARSE_EMPTY",
            ParseError::Subprocess(_) => "BOOK_PARSE_EXTRACTOR_FAILED",
            ParseError::Archive(_) => "BOOK_PARSE_ARCHIVE_INVALID",
            ParseError::Markup(_) => "BOOK_PARSE_MARKUP_INVALID",
            ParseError::Other(_) => "SYSTEM_INTERNAL",
        }
    }
}
