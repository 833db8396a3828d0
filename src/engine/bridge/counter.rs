/// ### English
/// Per-bridge frame statistics and log throttling.
///
/// ### 中文
/// 每个渲染桥的帧统计与日志节流。
#[derive(Debug)]
pub struct FrameCounter {
    attempted: u64,
    published: u64,
    dropped: u64,
    skipped: u64,
    log_interval: u64,
}

/// ### English
/// Snapshot of the counters.
///
/// ### 中文
/// 计数器快照。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub attempted: u64,
    pub published: u64,
    pub dropped: u64,
    pub skipped: u64,
}

impl FrameCounter {
    pub fn new(log_interval_frames: u32) -> Self {
        Self {
            attempted: 0,
            published: 0,
            dropped: 0,
            skipped: 0,
            log_interval: u64::from(log_interval_frames),
        }
    }

    /// ### English
    /// Counts one draw attempt and returns its 1-based index.
    ///
    /// ### 中文
    /// 计入一次绘制尝试，并返回其从 1 开始的序号。
    pub fn begin_frame(&mut self) -> u64 {
        self.attempted += 1;
        self.attempted
    }

    /// ### English
    /// Whether frame `index` gets the detailed log line.
    ///
    /// ### 中文
    /// 第 `index` 帧是否输出详细日志。
    pub fn is_detailed(&self, index: u64) -> bool {
        self.log_interval != 0 && index % self.log_interval == 0
    }

    pub fn record_published(&mut self) {
        self.published += 1;
    }

    pub fn record_dropped(&mut self) {
        self.dropped += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats {
            attempted: self.attempted,
            published: self.published,
            dropped: self.dropped,
            skipped: self.skipped,
        }
    }
}
