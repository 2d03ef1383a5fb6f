//! Shell command parsing.

use std::fmt;

pub const HELP: &str = "\
Commands:
  search <city>       look up a place by name
  here                weather at the device location
  coords <lat> <lon>  weather at coordinates
  refresh             re-fetch the current place
  unit                toggle between °C and °F
  fav                 save the current place as a favorite
  unfav <name>        remove a favorite
  favs                list favorites
  samples             show sample cities
  hide / show         pause or resume auto refresh
  help                show this help
  quit                exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search(String),
    Here,
    Coords { lat: f64, lon: f64 },
    Refresh,
    ToggleUnit,
    AddFavorite,
    RemoveFavorite(String),
    Favorites,
    Samples,
    Hide,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    Unknown(String),
    Usage(&'static str),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => f.write_str("Type a command, or `help`"),
            ParseError::Unknown(word) => write!(f, "Unknown command `{word}`; try `help`"),
            ParseError::Usage(usage) => write!(f, "Usage: {usage}"),
        }
    }
}

impl Command {
    /// Parse one input line. `search` keeps the rest of the line verbatim
    /// so that an empty query reaches validation.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Err(ParseError::Empty),
            "search" | "s" => Ok(Command::Search(rest.to_string())),
            "here" => Ok(Command::Here),
            "coords" => parse_coords(rest),
            "refresh" | "r" => Ok(Command::Refresh),
            "unit" | "u" => Ok(Command::ToggleUnit),
            "fav" => Ok(Command::AddFavorite),
            "unfav" if rest.is_empty() => Err(ParseError::Usage("unfav <name>")),
            "unfav" => Ok(Command::RemoveFavorite(rest.to_string())),
            "favs" => Ok(Command::Favorites),
            "samples" => Ok(Command::Samples),
            "hide" => Ok(Command::Hide),
            "show" => Ok(Command::Show),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

fn parse_coords(rest: &str) -> Result<Command, ParseError> {
    const USAGE: &str = "coords <lat> <lon>";
    let mut parts = rest.split(|c: char| c.is_whitespace() || c == ',').filter(|p| !p.is_empty());
    let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ParseError::Usage(USAGE));
    };
    let lat: f64 = lat.parse().map_err(|_| ParseError::Usage(USAGE))?;
    let lon: f64 = lon.parse().map_err(|_| ParseError::Usage(USAGE))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(ParseError::Usage(USAGE));
    }
    Ok(Command::Coords { lat, lon })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_keeps_spaces_in_name() {
        assert_eq!(
            Command::parse("search  New York ").unwrap(),
            Command::Search("New York".into())
        );
        assert_eq!(Command::parse("search").unwrap(), Command::Search(String::new()));
    }

    #[test]
    fn test_parse_coords() {
        assert_eq!(
            Command::parse("coords -6.2 106.8").unwrap(),
            Command::Coords { lat: -6.2, lon: 106.8 }
        );
        assert_eq!(
            Command::parse("coords 51.5, -0.12").unwrap(),
            Command::Coords { lat: 51.5, lon: -0.12 }
        );
        assert!(Command::parse("coords 91 0").is_err());
        assert!(Command::parse("coords 1").is_err());
        assert!(Command::parse("coords a b").is_err());
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("UNIT").unwrap(), Command::ToggleUnit);
        assert_eq!(Command::parse("fav").unwrap(), Command::AddFavorite);
        assert_eq!(
            Command::parse("unfav London, UK").unwrap(),
            Command::RemoveFavorite("London, UK".into())
        );
        assert_eq!(Command::parse("quit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse("   "), Err(ParseError::Empty));
        assert_eq!(Command::parse("unfav"), Err(ParseError::Usage("unfav <name>")));
        assert_eq!(
            Command::parse("dance").unwrap_err().to_string(),
            "Unknown command `dance`; try `help`"
        );
    }
}
