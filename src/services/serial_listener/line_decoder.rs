use crate::config::MAX_BUTTONS;
use crate::events::{ButtonId, Edge, Transition};

/// Маркер записи о переходе кнопки
const MARKER: u8 = b'b';
/// Символ на зарезервированной позиции при кодировании
const RESERVED: char = ':';

/// Декодер строк протокола панели: `b<кнопка><резерв><фронт>`
///
/// Состояния между вызовами не хранит; всё, что не похоже на запись,
/// молча отбрасывается.
#[derive(Debug, Clone, Copy)]
pub struct LineDecoder {
    button_count: u8,
}

impl LineDecoder {
    pub fn new(button_count: u8) -> Self {
        Self { button_count }
    }

    pub fn decode(&self, line: &[u8]) -> Option<Transition> {
        // Хвост после позиции 3 (например '\r') игнорируется
        let [marker, button, _, edge, ..] = line else {
            return None;
        };

        if *marker != MARKER || !button.is_ascii_digit() {
            return None;
        }

        let index = button - b'0';
        if index >= self.button_count {
            return None;
        }

        let edge = Edge::from_code(*edge)?;
        Some(Transition::new(ButtonId::from_index(index), edge))
    }

    #[allow(dead_code)]
    pub fn decode_str(&self, line: &str) -> Option<Transition> {
        self.decode(line.as_bytes())
    }

    /// Обратное преобразование для эмуляции и тестов.
    ///
    /// `None`, если номер кнопки не помещается в одну цифру протокола.
    pub fn encode(transition: Transition) -> Option<String> {
        let digit = transition
            .button
            .index()
            .filter(|&index| index < MAX_BUTTONS as usize)?;
        Some(format!(
            "{}{}{}{}",
            MARKER as char,
            digit,
            RESERVED,
            transition.edge.code()
        ))
    }
}
