// ussd/screen.rs
//
// A rendered menu frame. The gateway contract is a plain-text body whose
// first word tells it whether to keep the session open ("CON") or hang up
// ("END").

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub text: String,
    pub terminal: bool,
}

impl Screen {
    pub fn cont(text: impl Into<String>) -> Self {
        Screen {
            text: text.into(),
            terminal: false,
        }
    }

    pub fn end(text: impl Into<String>) -> Self {
        Screen {
            text: text.into(),
            terminal: true,
        }
    }

    pub fn render(&self) -> String {
        if self.terminal {
            format!("END {}", self.text)
        } else {
            format!("CON {}", self.text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_screens_start_with_con() {
        assert_eq!(Screen::cont("Pick one:\n1. A").render(), "CON Pick one:\n1. A");
    }

    #[test]
    fn terminal_screens_start_with_end() {
        assert_eq!(Screen::end("Bye.").render(), "END Bye.");
    }
}
