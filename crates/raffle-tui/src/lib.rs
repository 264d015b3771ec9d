// Terminal front end for the raffle engine.

pub mod tui;
