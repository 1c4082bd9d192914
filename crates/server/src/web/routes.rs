pub mod vcloud;
