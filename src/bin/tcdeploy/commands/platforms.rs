//! `tcdeploy platforms` command

use anyhow::Result;

use tcdeploy::PlatformTarget;

pub fn execute() -> Result<()> {
    for platform in PlatformTarget::ALL {
        println!("{:<10} -{}", platform.name(), platform.flag());
    }
    Ok(())
}
