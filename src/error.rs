use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnnotatorError>;

#[derive(Error, Debug)]
pub enum AnnotatorError {
    #[error("Filter index {index} is out of range for {len} filter(s).")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Unable to import the spreadsheet: {0}")]
    ImportParseFailure(String),

    #[error("Please enter a rating between {min} and {max} (received '{input}').")]
    InvalidRatingInput { input: String, min: u32, max: u32 },

    #[error("No record with id '{0}' is loaded.")]
    RecordNotFound(String),

    #[error("Record '{record}' does not match the column set: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        record: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("No data to analyze. Please adjust the filters first.")]
    NoRecords,

    #[error("A generation is already running for this view.")]
    GenerationInProgress,

    #[error("The view changed before the generated text was ready; the result was discarded.")]
    StaleGeneration,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
