use log::{error, info};

use structopt::StructOpt;

pub use linux_embedded_hal::sysfs_gpio::Direction;
pub use linux_embedded_hal::{spidev, spidev::SpiModeFlags, Pin as Pindev, Spidev};

use simplelog::{LevelFilter, TermLogger, TerminalMode};

use ihex::{Reader, Record};

use spi_flasher::{find_chip, Programmer, SpiTransport};

#[derive(Debug, PartialEq, StructOpt)]
struct Options {
    #[structopt(subcommand)]
    operation: Operations,

    /// SPI device
    #[structopt(long, default_value = "/dev/spidev0.0", env = "SPI_DEV")]
    spi_dev: String,

    /// SPI baud rate
    #[structopt(long, default_value = "1000000", env = "SPI_BAUD")]
    spi_baud: u32,

    /// Chip Select (output) pin
    #[structopt(long, default_value = "8", env = "CS_PIN")]
    cs_pin: u64,

    /// Configure log level
    #[structopt(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: LevelFilter,
}

#[derive(Debug, PartialEq, StructOpt)]
pub enum Operations {
    /// Identify the attached chip and print its descriptor
    Info,
    /// Read data from the flash and print it as hex
    Read {
        /// Flash address for read start in hex
        #[structopt(parse(try_from_str = parse_hex))]
        address: u32,
        /// Length of flash read in bytes
        #[structopt()]
        length: u32,
    },
    /// Write inline hex data starting at an erase-block boundary
    Write {
        /// Flash address for write start in hex
        #[structopt(parse(try_from_str = parse_hex))]
        address: u32,

        /// Data to write in hexadecimal
        #[structopt(long)]
        data: HexData,
    },
    /// Write a raw binary file (e.g. an FPGA bitstream)
    Program {
        /// Flash address for write start in hex
        #[structopt(parse(try_from_str = parse_hex))]
        address: u32,

        /// Input binary file
        file: String,
    },
    /// Dump flash into a hex file
    Dump {
        /// Flash address for read start in hex
        #[structopt(parse(try_from_str = parse_hex))]
        address: u32,

        /// Length of flash read in bytes
        #[structopt()]
        length: u32,

        /// Output ihex file
        #[structopt(long, default_value = "dump.ihex")]
        file: String,
    },
    /// Load flash from a hex file
    Load {
        /// Input ihex file
        file: String,
    },
}

#[derive(Debug, PartialEq)]
pub struct HexData(Vec<u8>);

impl std::str::FromStr for HexData {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode(s).map(HexData)
    }
}

fn parse_hex(s: &str) -> Result<u32, std::num::ParseIntError> {
    u32::from_str_radix(s, 16)
}

fn main() -> Result<(), Box<dyn std::error::Error + 'static>> {
    // Load options
    let opts = Options::from_args();

    // Setup logging
    TermLogger::init(
        opts.log_level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
    )
    .unwrap();

    // Connect and configure GPIO pin
    let cs_pin = Pindev::new(opts.cs_pin);

    cs_pin.export().unwrap();
    cs_pin.set_direction(Direction::Out).unwrap();

    // Connect and configure SPI device
    let mut spi = Spidev::open(opts.spi_dev).unwrap();

    let mut spi_config = spidev::SpidevOptions::new();
    spi_config.mode(SpiModeFlags::SPI_MODE_0 | SpiModeFlags::SPI_NO_CS);
    spi_config.max_speed_hz(opts.spi_baud);
    spi.configure(&spi_config).unwrap();

    let mut transport = SpiTransport::new(spi, cs_pin);

    // Identify the attached chip before doing anything to it
    let chip = match find_chip(&mut transport) {
        Ok(chip) => chip,
        Err(e) => {
            error!("Chip identification failed: {}", e);
            return Ok(());
        }
    };
    info!(
        "Found {} {}: {} KiB, {} byte pages",
        chip.vendor, chip.name, chip.capacity_kib, chip.page_size
    );

    let mut programmer = Programmer::new(&mut transport, chip);

    // Perform the requested operation
    match opts.operation {
        Operations::Info => {
            for region in chip.erase_regions {
                info!("  {} erase blocks of {} bytes", region.count, region.size);
            }
        }
        Operations::Read { address, length } => {
            info!("Reading {} bytes from address 0x{:08x}", length, address);

            let mut buff = vec![0u8; length as usize];
            programmer.read(address, &mut buff).unwrap();

            info!("Read: {:02x?}", buff);
        }
        Operations::Write { address, data } => {
            info!("Writing {} bytes to address 0x{:08x}", data.0.len(), address);

            programmer.write(address, &data.0).unwrap();

            info!("Write complete");
        }
        Operations::Program { address, file } => {
            info!("Programming file {} at address 0x{:08x}", &file, address);

            let data = std::fs::read(&file).unwrap();
            programmer.write(address, &data).unwrap();

            info!("Program complete");
        }
        Operations::Dump {
            address,
            length,
            file,
        } => {
            info!(
                "Reading {} bytes from address 0x{:08x} to file {}",
                length, address, &file
            );

            let mut buff = vec![0u8; length as usize];
            programmer.read(address, &mut buff).unwrap();

            let mut records = Vec::new();
            for (c, chunk) in buff.chunks(32).enumerate() {
                records.push(Record::Data {
                    offset: (address as usize + c * 32) as u16,
                    value: chunk.to_vec(),
                });
            }
            records.push(Record::EndOfFile);

            let data = ihex::create_object_file_representation(&records).unwrap();

            std::fs::write(file, data).unwrap();

            info!("Dump complete");
        }
        Operations::Load { file } => {
            info!("Loading file {}", file);

            let data = String::from_utf8(std::fs::read(&file).unwrap()).unwrap();

            // Assemble the records into one contiguous image so the
            // flash sees a single erase-and-program pass instead of one
            // per 16-byte record.
            let mut base: Option<u32> = None;
            let mut image = Vec::new();
            for record in Reader::new(&data) {
                match record {
                    Ok(Record::Data { offset, value }) => {
                        let offset = u32::from(offset);
                        match base {
                            None => base = Some(offset),
                            Some(b) if b + image.len() as u32 == offset => (),
                            Some(_) => {
                                error!("Non-contiguous record at offset 0x{:04x}", offset);
                                return Ok(());
                            }
                        }
                        image.extend_from_slice(&value);
                    }
                    Ok(Record::EndOfFile) => (),
                    Err(e) => {
                        error!("Reader error: {:?}", e);
                        return Ok(());
                    }
                    _ => {
                        error!("Unrecognised record: {:?}", record);
                        return Ok(());
                    }
                }
            }

            programmer.write(base.unwrap_or(0), &image).unwrap();

            info!("Load complete");
        }
    }

    Ok(())
}
