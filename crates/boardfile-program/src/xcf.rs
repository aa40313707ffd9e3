//! Lattice ispXCF chain descriptor, consumed by Diamond's `pgrcmd`.

use std::collections::BTreeMap;

use boardfile_platform::XcfIdentity;

/// Single-device JTAG chain programmed with "Fast Program".
pub const XCF_TEMPLATE: &str = r#"<?xml version='1.0' encoding='utf-8' ?>
<!DOCTYPE        ispXCF    SYSTEM    "IspXCF.dtd" >
<ispXCF version="3.4.1">
    <Comment></Comment>
    <Chain>
        <Comm>JTAG</Comm>
        <Device>
            <SelectedProg value="TRUE"/>
            <Pos>1</Pos>
            <Vendor>Lattice</Vendor>
            <Family>{{family}}</Family>
            <Name>{{device}}</Name>
            <IDCode>{{idcode}}</IDCode>
            <File>{{bitstream_file}}</File>
            <Operation>Fast Program</Operation>
        </Device>
    </Chain>
    <ProjectOptions>
        <Program>SEQUENTIAL</Program>
        <Process>ENTIRED CHAIN</Process>
        <OperationOverride>No Override</OperationOverride>
        <StartTAP>TLR</StartTAP>
        <EndTAP>TLR</EndTAP>
        <VerifyUsercode value="FALSE"/>
    </ProjectOptions>
    <CableOptions>
        <CableName>{{cable}}</CableName>
        <PortAdd>{{port}}</PortAdd>
        <USBID>{{usb_id}}</USBID>
    </CableOptions>
</ispXCF>
"#;

/// File extension of a rendered chain descriptor.
pub const XCF_EXTENSION: &str = "xcf";

/// Placeholder values taken from the device and cable identity. The
/// bitstream path is added at render time.
pub fn identity_values(identity: &XcfIdentity) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("family".to_string(), identity.family.clone()),
        ("device".to_string(), identity.device.clone()),
        ("idcode".to_string(), identity.idcode.to_string()),
        ("cable".to_string(), identity.cable.clone()),
        ("port".to_string(), identity.port.clone()),
        ("usb_id".to_string(), identity.usb_id.clone()),
    ])
}
