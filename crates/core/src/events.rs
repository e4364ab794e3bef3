use crate::{DrawMode, LotteryNumbers, Pick, WeightMode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    OptionAdded { index: usize, label: String },
    OptionRemoved { index: usize, label: String },
    OptionRenamed { index: usize, label: String },
    OptionsReplaced { count: usize },
    WeightsChanged { method: WeightMode, total: f64 },
    DrawModeChanged { mode: DrawMode },
    WinnerPicked { pick: Pick },
    DraftDrawn {
        picks: Vec<Pick>,
        with_replacement: bool,
    },
    DraftAdvanced {
        round: usize,
        pick: Pick,
        remaining: usize,
    },
    DraftCompleted { picks: usize },
    LotteryDrawn { numbers: LotteryNumbers },
    ResultsReset,
}

#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<Event>,
}

impl EventBus {
    pub fn push(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }
}
