//! Command-line interface and REPL

use anyhow::Result;
use colored::*;
use rustyline::DefaultEditor;

use roland_gw::midi::format_hex;
use roland_gw::{discovery, Instrument, Piano, Register};

/// Interactive prompt speaking the same verbs as the subcommands.
pub async fn run_repl(piano: &Piano) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("Type {} for a command list, {} to leave.", "help".bold(), "quit".bold());

    loop {
        let readline = rl.readline("roland> ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                if line == "exit" || line == "quit" {
                    break;
                }
                let parts: Vec<&str> = line.split_whitespace().collect();
                if let Err(e) = run_verb(piano, &parts).await {
                    println!("{} {}", "error:".red(), e);
                }
            }
            Err(_) => break,
        }
    }

    Ok(())
}

async fn run_verb(piano: &Piano, parts: &[&str]) -> Result<()> {
    match parts {
        ["help"] | ["?"] => print_help(),
        ["ports"] => print_ports(),
        ["registers"] => print_registers(),
        ["instruments"] => print_instruments(),
        ["volume"] => println!("volume: {}", piano.volume().await?.to_string().green()),
        ["volume", v] => piano.set_volume(v.parse()?)?,
        ["tempo"] => println!("tempo: {}", piano.metronome().bpm().await?.to_string().green()),
        ["tempo", v] => piano.metronome().set_bpm(v.parse()?)?,
        ["transpose"] => println!("transpose: {}", piano.transpose().await?.to_string().green()),
        ["transpose", v] => piano.set_transpose(v.parse()?)?,
        ["instrument"] => println!("instrument: {}", piano.instrument().await?.to_string().green()),
        ["instrument", rest @ ..] => {
            let name = rest.join(" ");
            let instrument = Instrument::from_name(&name)
                .ok_or_else(|| anyhow::anyhow!("unknown instrument: {}", name))?;
            piano.set_instrument(instrument)?;
        }
        ["metronome", "on"] => piano.metronome().enable(true).await?,
        ["metronome", "off"] => piano.metronome().enable(false).await?,
        ["metronome", "toggle"] => piano.metronome().toggle()?,
        ["uptime"] => println!("uptime: {}", format_uptime(piano.uptime().await?).green()),
        ["read", name] => {
            let register = Register::from_name(name)?;
            let value = piano.read_register(register).await?;
            println!("{} = {}", register, value.to_string().green());
        }
        ["write", name, value] => {
            let register = Register::from_name(name)?;
            piano.write_register(register, parse_number_maybe_hex(value)?)?;
        }
        _ => println!("unknown command, try {}", "help".bold()),
    }
    Ok(())
}

fn print_help() {
    println!("\n{}", "Commands:".bold());
    println!("  volume [value]           read or set the master volume");
    println!("  tempo [bpm]              read or set the sequencer tempo");
    println!("  transpose [semitones]    read or set the key transpose");
    println!("  instrument [name]        read or set the current tone");
    println!("  metronome on|off|toggle  switch the metronome");
    println!("  read <register>          read any register by name");
    println!("  write <register> <value> write any register, decimal or 0x hex");
    println!("  uptime                   time since power-on");
    println!("  ports | registers | instruments");
    println!("  quit");
}

/// Parse a number that might be in hex format ("0x...") or decimal.
pub fn parse_number_maybe_hex(text: &str) -> Result<i64> {
    if text.starts_with("0x") || text.starts_with("0X") {
        Ok(i64::from_str_radix(&text[2..], 16)?)
    } else {
        Ok(text.parse()?)
    }
}

pub fn format_uptime(ms: u64) -> String {
    let seconds = ms / 1000;
    let days = seconds / 86_400;
    let rem = seconds % 86_400;
    format!(
        "{}d {:02}:{:02}:{:02}",
        days,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

pub fn print_ports() {
    println!("\n{}", "=== Available MIDI Ports ===".bold().cyan());

    if let Ok(inputs) = discovery::list_input_ports() {
        println!("\n{}", "Input Ports:".bold());
        if inputs.is_empty() {
            println!("  {}", "No input ports found".dimmed());
        } else {
            for name in inputs {
                println!("  {} {}", port_marker(&name), name);
            }
        }
    }

    if let Ok(outputs) = discovery::list_output_ports() {
        println!("\n{}", "Output Ports:".bold());
        if outputs.is_empty() {
            println!("  {}", "No output ports found".dimmed());
        } else {
            for name in outputs {
                println!("  {} {}", port_marker(&name), name);
            }
        }
    }

    if let Ok(port) = discovery::discover(0) {
        println!("\n{}", "Auto-detected piano:".bold().bright_green());
        println!("  {}", port.bright_white());
    }
}

fn port_marker(name: &str) -> ColoredString {
    if name.starts_with(discovery::DEVICE_NAME_PREFIX) {
        "[PIANO]".green()
    } else {
        "[OTHER]".dimmed()
    }
}

pub fn print_registers() {
    println!("\n{}", "=== Register Catalog ===".bold().cyan());
    // Pad before coloring: ANSI escapes would throw off the column widths.
    println!(
        "\n  {}",
        format!("{:28} {:11} {}", "NAME", "ADDRESS", "WIDTH").bold()
    );
    for register in Register::all() {
        let d = register.descriptor();
        println!(
            "  {:28} {}  {:>2}",
            d.name,
            format_hex(&d.address).green(),
            d.width
        );
    }
    println!(
        "\n  Total registers: {}",
        Register::all().count().to_string().green()
    );
}

pub fn print_instruments() {
    println!("\n{}", "=== Tone Table ===".bold().cyan());
    println!(
        "\n  {}",
        format!("{:24} {:>4} {:>7}", "NAME", "BANK", "PROGRAM").bold()
    );
    for instrument in Instrument::all() {
        if let Some((bank, program)) = instrument.bank_program() {
            println!("  {:24} {:>4} {:>7}", instrument.as_str(), bank, program);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_decimal() {
        assert_eq!(parse_number_maybe_hex("64").unwrap(), 64);
        assert_eq!(parse_number_maybe_hex("-6").unwrap(), -6);
    }

    #[test]
    fn test_parse_number_hex() {
        assert_eq!(parse_number_maybe_hex("0x7F").unwrap(), 127);
        assert_eq!(parse_number_maybe_hex("0X10").unwrap(), 16);
    }

    #[test]
    fn test_parse_number_garbage_is_rejected() {
        assert!(parse_number_maybe_hex("fast").is_err());
        assert!(parse_number_maybe_hex("0xZZ").is_err());
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "0d 00:00:00");
        assert_eq!(format_uptime(90_061_000), "1d 01:01:01");
    }
}
