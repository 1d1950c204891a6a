/// What is being looked up.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Free text, already normalized by the caller. Shingled by the index with
    /// its own q-gram length and word view.
    Text(String),
    /// Shingles produced by the caller.
    Shingles(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Query {
    pub input: Input,
    /// Limit result count (k). None returns every ranked candidate.
    pub limit: Option<usize>,
    /// Overrides the similarity threshold of the index for this query.
    pub threshold: Option<f64>,
}

impl Query {
    pub fn text(text: &str) -> Self {
        Self::new(Input::Text(text.to_string()))
    }

    pub fn shingles<S: AsRef<str>>(shingles: &[S]) -> Self {
        Self::new(Input::Shingles(
            shingles.iter().map(|shingle| shingle.as_ref().to_string()).collect()
        ))
    }

    fn new(input: Input) -> Self {
        Self {
            input,
            limit: None,
            threshold: None,
        }
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn threshold(mut self, threshold: Option<f64>) -> Self {
        self.threshold = threshold;
        self
    }
}
