use serde::{Deserialize, Serialize};
use std::fmt;

/// Номер кнопки панели (нумерация с 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ButtonId(pub u8);

impl ButtonId {
    pub fn new(id: u8) -> Self {
        Self(id)
    }

    /// Построить из цифры протокола (нумерация с 0)
    pub fn from_index(index: u8) -> Self {
        Self(index + 1)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Индекс в таблице состояний; `None` для нулевого номера
    pub fn index(&self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// Физический фронт сигнала кнопки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Down,
    Up,
}

impl Edge {
    /// Код фронта в протоколе: `0` = нажатие, `1` = отпускание
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'0' => Some(Edge::Down),
            b'1' => Some(Edge::Up),
            _ => None,
        }
    }

    pub fn code(&self) -> char {
        match self {
            Edge::Down => '0',
            Edge::Up => '1',
        }
    }
}

/// Один декодированный переход кнопки
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub button: ButtonId,
    pub edge: Edge,
}

impl Transition {
    pub fn new(button: ButtonId, edge: Edge) -> Self {
        Self { button, edge }
    }

    #[allow(dead_code)]
    pub fn down(button: ButtonId) -> Self {
        Self::new(button, Edge::Down)
    }

    #[allow(dead_code)]
    pub fn up(button: ButtonId) -> Self {
        Self::new(button, Edge::Up)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.button, self.edge)
    }
}
