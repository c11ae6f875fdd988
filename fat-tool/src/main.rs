mod block_file;
mod cli;

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::sync::Arc;

use block_dev::BlockDevice;
use clap::Parser;
use fat16::{FatFileSystem, FatLookup, MountOptions, NameMatch};
use typed_bytesize::ByteSizeIec;
use vfs::DirEntryType;

pub use self::{
    block_file::BlockFile,
    cli::{Cli, Command},
};

fn main() -> io::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let writable = matches!(cli.command, Command::Write { .. });
    log::info!("image={:?} writable={writable}", cli.image);

    let fd = OpenOptions::new()
        .read(true)
        .write(writable)
        .open(&cli.image)?;
    let block_dev: Arc<dyn BlockDevice> = Arc::new(BlockFile::new(fd));

    let options = MountOptions {
        fat_lookup: if cli.first_sector_fat {
            FatLookup::FirstSector
        } else {
            FatLookup::Full
        },
        name_match: if cli.raw_names {
            NameMatch::Raw
        } else {
            NameMatch::Canonical
        },
        ..MountOptions::default()
    };
    let mut fs = FatFileSystem::mount(&block_dev, options).map_err(into_io)?;

    match cli.command {
        Command::Info => info(&fs),
        Command::Ls { path } => ls(&fs, &path),
        Command::Cat { path } => cat(&mut fs, &path),
        Command::Write {
            path,
            input,
            offset,
        } => {
            let data = fs::read(input)?;
            write(&mut fs, &path, offset, &data)
        }
    }
}

fn info(fs: &FatFileSystem) -> io::Result<()> {
    let bpb = fs.boot_sector();
    let geometry = fs.geometry();

    println!("oem name:            {}", String::from_utf8_lossy(&bpb.oem_name()));
    println!("bytes per sector:    {}", bpb.sector_bytes());
    println!("sectors per cluster: {}", bpb.cluster_sectors());
    println!("reserved sectors:    {}", bpb.reserved_sectors());
    println!("FATs:                {} x {} sectors", bpb.fat_count(), bpb.fat_sectors());
    println!("root entries:        {}", bpb.root_entries());
    println!("media:               {:#04x}", bpb.media());
    println!(
        "total sectors:       {} ({})",
        bpb.total_sectors(),
        ByteSizeIec((bpb.total_sectors() * bpb.sector_bytes()) as u64)
    );
    println!("FAT start:           {}", geometry.fat_start);
    println!(
        "root directory:      {} (+{})",
        geometry.root_dir_start, geometry.root_dir_sectors
    );
    println!("first cluster:       {}", geometry.cluster_start);
    println!(
        "clusters:            {} x {}",
        geometry.total_clusters,
        ByteSizeIec(geometry.cluster_bytes() as u64)
    );

    Ok(())
}

fn ls(fs: &FatFileSystem, path: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    for entry in fs.list(path).map_err(into_io)? {
        let kind = match entry.ty {
            DirEntryType::Directory => 'd',
            DirEntryType::Regular => '-',
        };
        writeln!(
            stdout,
            "{kind} {:>10} {:>6} {}",
            ByteSizeIec(entry.size).to_string(),
            entry.inode,
            entry.name
        )?;
    }

    Ok(())
}

fn cat(fs: &mut FatFileSystem, path: &str) -> io::Result<()> {
    let fd = fs.open(path, "r").map_err(into_io)?;
    let mut stdout = io::stdout().lock();
    let mut buf = [0; 4096];
    loop {
        let n = fs.read(fd, &mut buf).map_err(into_io)?;
        if n == 0 {
            break;
        }
        stdout.write_all(&buf[..n])?;
    }
    fs.close(fd).map_err(into_io)
}

fn write(fs: &mut FatFileSystem, path: &str, offset: usize, data: &[u8]) -> io::Result<()> {
    let fd = fs.open(path, "r+").map_err(into_io)?;
    let size = fs.file(fd).map_err(into_io)?.size();
    if fs.seek(fd, offset).map_err(into_io)? < offset {
        log::warn!("offset {offset} is past the end of {path:?} ({size} bytes)");
    }

    let n = fs.write(fd, data).map_err(into_io)?;
    if n < data.len() {
        println!("wrote {n} of {} bytes, {path:?} cannot grow past {size} bytes", data.len());
    } else {
        println!("wrote {n} bytes");
    }
    fs.close(fd).map_err(into_io)
}

fn into_io(err: vfs::Error) -> io::Error {
    let kind = match err {
        vfs::Error::NotFound => io::ErrorKind::NotFound,
        vfs::Error::NotADirectory => io::ErrorKind::NotADirectory,
        vfs::Error::IsADirectory => io::ErrorKind::IsADirectory,
        vfs::Error::PermissionDenied => io::ErrorKind::PermissionDenied,
        vfs::Error::InvalidMode => io::ErrorKind::InvalidInput,
        vfs::Error::CorruptFilesystem => io::ErrorKind::InvalidData,
        vfs::Error::ResourceExhausted | vfs::Error::NotOpen => io::ErrorKind::Other,
    };
    io::Error::new(kind, err)
}
