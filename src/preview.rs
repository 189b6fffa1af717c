use std::{ops::ControlFlow, time::Duration};

use log::debug;
use tokio::time::{interval, MissedTickBehavior};

use crate::{error::FilterResult, frame::Frame, media::FrameSource, session::Session};

/// Looping on-screen playback of an open video. Never writes output.
pub struct Preview {
    source: Box<dyn FrameSource>,
    current: Option<Frame>,
}

impl Preview {
    /// Takes over `source` and reads its first frame as the current frame.
    pub fn start(mut source: Box<dyn FrameSource>) -> FilterResult<Self> {
        let current = source.next_frame()?;
        Ok(Self { source, current })
    }

    /// The last unfiltered frame read.
    pub fn current(&self) -> Option<&Frame> {
        self.current.as_ref()
    }

    /// Shows the current frame and advances to the next one, seeking back to the start at
    /// the end of the stream. `None` only for a stream with no frames at all.
    pub fn next(&mut self, session: &Session) -> FilterResult<Option<Frame>> {
        let Some(frame) = self.current.take() else {
            return Ok(None);
        };

        let shown = match session.selected() {
            Some(_) => session.apply(&frame),
            None => Ok(frame.clone()),
        };

        self.current = match self.source.next_frame()? {
            Some(next) => Some(next),
            None => {
                debug!("preview reached end of stream, rewinding");
                self.source.rewind()?;
                self.source.next_frame()?
            }
        };

        shown.map(Some)
    }

    /// Drives [`Preview::next`] once per `period` until `on_frame` breaks. `on_frame`
    /// receives the session so parameters can change between frames.
    pub async fn run<F>(
        &mut self,
        session: &mut Session,
        period: Duration,
        mut on_frame: F,
    ) -> FilterResult<usize>
    where
        F: FnMut(&Frame, &mut Session) -> ControlFlow<()>,
    {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shown = 0;

        loop {
            ticker.tick().await;
            let Some(frame) = self.next(session)? else {
                return Ok(shown);
            };
            shown += 1;

            if on_frame(&frame, session).is_break() {
                return Ok(shown);
            }
        }
    }
}
