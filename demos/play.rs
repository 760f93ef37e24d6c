use std::process;

use log::{error, Level};
use structopt::StructOpt;

use fx_soundboard::{
    Config, ListingShape, ResetLine, Result, SerialTransport, Soundboard, TrackRef,
};

#[derive(StructOpt, Debug)]
#[structopt(name = "play")]
struct Opt {
    /// Serial port the sound board is attached to
    #[structopt(short, long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Track to play, by index
    #[structopt(short, long)]
    track: Option<u32>,

    /// Track to play, by 11 character filename (e.g. "T00     OGG")
    #[structopt(short, long)]
    name: Option<String>,

    /// Volume to set before playing (0-204)
    #[structopt(long)]
    volume: Option<i32>,

    /// List the files on the board
    #[structopt(short, long)]
    list: bool,

    /// Board answers listings as text lines
    #[structopt(long)]
    alt_listing: bool,

    /// Reset the board first, by pulsing DTR
    #[structopt(long)]
    reset: bool,

    /// Trace every command and reply
    #[structopt(short, long)]
    debug: bool,

    /// Turn on verbose messages
    #[structopt(short, long)]
    verbose: bool,
}

fn run(opt: &Opt) -> Result<()> {
    let mut transport = SerialTransport::open(&opt.port)?;
    if opt.reset {
        transport = transport.with_reset_line(ResetLine::Dtr)?;
    }

    let mut config = Config::new().debug(opt.debug);
    if opt.alt_listing {
        config = config.listing_shape(ListingShape::Alternate);
    }
    if let Some(volume) = opt.volume {
        config = config.initial_volume(volume);
    }

    let mut board = Soundboard::connect(transport, config)?;
    if opt.reset {
        let banner = board.reset()?;
        println!("{} ({}, {})", banner.product, banner.fat, banner.files);
    }
    println!("Volume: {}", board.volume());

    if opt.list {
        for entry in board.list_files(false)? {
            println!("{:5} {} {:10}", entry.index(), entry.filename(), entry.size());
        }
    }

    let track = match (&opt.name, opt.track) {
        (Some(name), _) => Some(TrackRef::filename(name)?),
        (None, Some(index)) => Some(TrackRef::Index(index)),
        (None, None) => None,
    };
    if let Some(track) = track {
        board.play_now(&track)?;
        println!("Playing {}", track);
    }
    Ok(())
}

fn main() {
    let opt = Opt::from_args();

    let level = if opt.debug { Level::Debug } else { Level::Info };
    simple_logger::init_with_level(level).unwrap();

    if opt.verbose {
        println!("{:#?}", opt);
    }

    if let Err(err) = run(&opt) {
        error!("{}", err);
        process::exit(1);
    }
}
