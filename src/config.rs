/// User-facing scan options with sensible defaults and builder chaining.
/// Defaults mirror the January-2024 beginner study: rapid time controls,
/// sub-1000 ceiling, 15-game activity floor, 5k sample.
#[derive(Clone, Debug)]
pub struct ScanOptions {
    pub time_controls: Vec<String>,   // accepted TimeControl tag values
    pub rating_ceiling: u32,          // a game qualifies if either side is at or under this
    pub min_games: u64,               // activity threshold for the sampled population
    pub sample_size: usize,           // target sample size (may exceed the population)
    pub seed: Option<u64>,            // Some(seed) for reproducible sampling
    pub require_timestamps: bool,     // skip games whose UTCDate/UTCTime cannot be parsed
    pub progress_every_lines: u64,    // cadence of progress reports; 0 disables
    pub progress: bool,               // show progress bar
    pub progress_label: Option<String>,

    // IO tuning
    pub read_buffer_bytes: usize,     // BufReader capacity over the decoder
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            time_controls: ["600+0", "600+5", "900+10"].iter().map(|s| s.to_string()).collect(),
            rating_ceiling: 1000,
            min_games: 15,
            sample_size: 5000,
            seed: None,
            require_timestamps: false,
            progress_every_lines: 5_000_000,
            progress: true,
            progress_label: None,

            read_buffer_bytes: 256 * 1024,
        }
    }
}

impl ScanOptions {
    pub fn with_time_controls<I, S>(mut self, tcs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.time_controls = tcs.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_rating_ceiling(mut self, ceiling: u32) -> Self {
        self.rating_ceiling = ceiling;
        self
    }
    pub fn with_min_games(mut self, n: u64) -> Self {
        self.min_games = n;
        self
    }
    pub fn with_sample_size(mut self, n: usize) -> Self {
        self.sample_size = n;
        self
    }
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn with_require_timestamps(mut self, yes: bool) -> Self {
        self.require_timestamps = yes;
        self
    }
    pub fn with_progress_every_lines(mut self, lines: u64) -> Self {
        self.progress_every_lines = lines;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }
    pub fn with_io_read_buffer(mut self, bytes: usize) -> Self {
        self.read_buffer_bytes = bytes.max(8 * 1024);
        self
    }
}
