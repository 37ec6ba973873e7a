use std::fmt::Display;

use miette::miette;

#[derive(Debug)]
pub enum Error {
    /// The enrichment input did not contain a single record with a video id
    NoUsableIds,

    /// The metadata API answered with an error
    Api { status: u16, message: String },

    Miette(miette::Report),
}

impl From<miette::Report> for Error {
    fn from(err: miette::Report) -> Self {
        Error::Miette(err)
    }
}

impl From<Error> for miette::Report {
    fn from(err: Error) -> Self {
        match err {
            Error::NoUsableIds => miette!("No 'youtubeId' fields found in input"),
            Error::Api { status, message } => {
                miette!("Metadata API request failed with status {status}: {message}")
            }
            Error::Miette(err) => err,
        }
    }
}

impl Error {
    pub fn wrap_err_with<D, F>(self, f: F) -> Error
    where
        D: Display + Send + Sync + 'static,
        F: FnOnce() -> D,
    {
        match self {
            Error::Miette(report) => Error::Miette(report.wrap_err(f())),
            err => Error::Miette(miette::Report::from(err).wrap_err(f())),
        }
    }
}

/// Shorthand to return early with a plain error message
pub fn bail<T, D>(msg: D) -> Result<T>
where
    D: Display + std::fmt::Debug + Send + Sync + 'static,
{
    Err(err_msg(msg))
}

pub fn err_msg<D>(msg: D) -> Error
where
    D: Display + std::fmt::Debug + Send + Sync + 'static,
{
    Error::Miette(miette::Report::msg(msg))
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_renders_status_and_message() {
        let report = miette::Report::from(Error::Api {
            status: 403,
            message: "quota exceeded".to_owned(),
        });

        let text = report.to_string();
        assert!(text.contains("403"));
        assert!(text.contains("quota exceeded"));
    }

    #[test]
    fn wrap_err_keeps_the_root_cause() {
        let err = Error::NoUsableIds.wrap_err_with(|| "Could not enrich");
        let Error::Miette(report) = err else {
            panic!("expected a wrapped report");
        };

        assert_eq!(report.to_string(), "Could not enrich");
        let chain: Vec<String> = report.chain().map(ToString::to_string).collect();
        assert!(chain.iter().any(|s| s.contains("youtubeId")));
    }
}
