use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
pub struct Cli {
    /// FAT16 disk image
    pub image: PathBuf,

    /// Follow cluster chains through the first FAT sector only
    #[arg(long)]
    pub first_sector_fat: bool,

    /// Compare the first 8 name bytes with path components verbatim
    #[arg(long)]
    pub raw_names: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the boot sector and the derived layout
    Info,

    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },

    /// Print a file to stdout
    Cat { path: String },

    /// Overwrite a file in place with the contents of a host file
    Write {
        path: String,

        /// Host file to copy from
        input: PathBuf,

        /// Byte offset into the FAT16 file
        #[arg(long, short, default_value_t = 0)]
        offset: usize,
    },
}
