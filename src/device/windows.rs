//! Core Audio device service (Windows)
//!
//! Enumeration and names come from the documented MMDevice API. Setting a
//! default endpoint goes through `IPolicyConfig`, which Windows ships but
//! does not document; the vtable layout below is the Windows 7+ one.

#![allow(non_snake_case)]

use crate::core::error::DispatchError;
use crate::core::types::{Direction, Role};
use crate::device::DeviceService;
use std::ffi::c_void;
use windows::core::{interface, IUnknown, IUnknown_Vtbl, GUID, HRESULT, HSTRING, PCWSTR};
use windows::Win32::Devices::FunctionDiscovery::PKEY_Device_FriendlyName;
use windows::Win32::Media::Audio::{
    eAll, eCapture, eCommunications, eConsole, eRender, EDataFlow, ERole, IMMDevice,
    IMMDeviceCollection, IMMDeviceEnumerator, MMDeviceEnumerator, DEVICE_STATE_ACTIVE,
};
use windows::Win32::System::Com::StructuredStorage::PropVariantToStringAlloc;
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoTaskMemFree, CoUninitialize, CLSCTX_ALL,
    COINIT_APARTMENTTHREADED, STGM_READ,
};

const CLSID_POLICY_CONFIG_CLIENT: GUID = GUID::from_u128(0x870af99c_171d_4f9e_af0d_e63df40c2bc9);

#[interface("f8679f50-850a-41cf-9c72-430f290290c8")]
unsafe trait IPolicyConfig: IUnknown {
    fn GetMixFormat(&self, device_id: PCWSTR, format: *mut *mut c_void) -> HRESULT;
    fn GetDeviceFormat(&self, device_id: PCWSTR, default: i32, format: *mut *mut c_void) -> HRESULT;
    fn ResetDeviceFormat(&self, device_id: PCWSTR) -> HRESULT;
    fn SetDeviceFormat(
        &self,
        device_id: PCWSTR,
        endpoint: *mut c_void,
        mix: *mut c_void,
    ) -> HRESULT;
    fn GetProcessingPeriod(
        &self,
        device_id: PCWSTR,
        default: i32,
        default_period: *mut i64,
        minimum_period: *mut i64,
    ) -> HRESULT;
    fn SetProcessingPeriod(&self, device_id: PCWSTR, period: *mut i64) -> HRESULT;
    fn GetShareMode(&self, device_id: PCWSTR, mode: *mut c_void) -> HRESULT;
    fn SetShareMode(&self, device_id: PCWSTR, mode: *mut c_void) -> HRESULT;
    fn GetPropertyValue(
        &self,
        device_id: PCWSTR,
        fx_store: i32,
        key: *const c_void,
        value: *mut c_void,
    ) -> HRESULT;
    fn SetPropertyValue(
        &self,
        device_id: PCWSTR,
        fx_store: i32,
        key: *const c_void,
        value: *mut c_void,
    ) -> HRESULT;
    fn SetDefaultEndpoint(&self, device_id: PCWSTR, role: ERole) -> HRESULT;
    fn SetEndpointVisibility(&self, device_id: PCWSTR, visible: i32) -> HRESULT;
}

/// An active endpoint and its id
pub struct WasapiDevice {
    device: IMMDevice,
    id: HSTRING,
}

/// Uninitializes COM when dropped
struct ComApartment;

impl Drop for ComApartment {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
    }
}

pub struct WasapiDevices {
    enumerator: IMMDeviceEnumerator,
    policy: IPolicyConfig,
    // Dropped last so the interfaces above are released first
    _apartment: ComApartment,
}

impl WasapiDevices {
    /// Enter a single-threaded COM apartment and create the enumerator
    pub fn new() -> Result<Self, DispatchError> {
        let fail = |e: windows::core::Error| DispatchError::enumeration(None::<Direction>, e);

        unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }
            .map_err(fail)?;
        let apartment = ComApartment;

        let enumerator: IMMDeviceEnumerator =
            unsafe { CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL) }
                .map_err(fail)?;
        let policy: IPolicyConfig =
            unsafe { CoCreateInstance(&CLSID_POLICY_CONFIG_CLIENT, None, CLSCTX_ALL) }
                .map_err(fail)?;

        tracing::debug!("Core Audio device service ready");
        Ok(Self {
            enumerator,
            policy,
            _apartment: apartment,
        })
    }

    fn collect(
        &self,
        flow: EDataFlow,
        direction: Option<Direction>,
    ) -> Result<Vec<WasapiDevice>, DispatchError> {
        let fail = |e: windows::core::Error| DispatchError::enumeration(direction, e);

        let collection: IMMDeviceCollection =
            unsafe { self.enumerator.EnumAudioEndpoints(flow, DEVICE_STATE_ACTIVE) }
                .map_err(fail)?;
        let count = unsafe { collection.GetCount() }.map_err(fail)?;

        let mut devices = Vec::with_capacity(count as usize);
        for index in 0..count {
            let device = unsafe { collection.Item(index) }.map_err(fail)?;
            let id = device_id(&device)
                .map_err(|reason| DispatchError::enumeration(direction, reason))?;
            devices.push(WasapiDevice { device, id });
        }
        Ok(devices)
    }
}

fn device_id(device: &IMMDevice) -> Result<HSTRING, String> {
    unsafe {
        let raw = device.GetId().map_err(|e| e.to_string())?;
        let id = raw.to_string();
        CoTaskMemFree(Some(raw.0 as *const c_void));
        id.map(|id| HSTRING::from(id.as_str()))
            .map_err(|e| e.to_string())
    }
}

fn data_flow(direction: Direction) -> EDataFlow {
    match direction {
        Direction::Input => eCapture,
        Direction::Output => eRender,
    }
}

fn endpoint_role(role: Role) -> ERole {
    match role {
        Role::Console => eConsole,
        Role::Communications => eCommunications,
    }
}

impl DeviceService for WasapiDevices {
    type Device = WasapiDevice;

    fn enumerate(&self, direction: Direction) -> Result<Vec<WasapiDevice>, DispatchError> {
        self.collect(data_flow(direction), Some(direction))
    }

    fn enumerate_all(&self) -> Result<Vec<WasapiDevice>, DispatchError> {
        self.collect(eAll, None)
    }

    fn name_of(&self, device: &WasapiDevice) -> Result<String, DispatchError> {
        let fail = |e: windows::core::Error| DispatchError::NameLookupFailed {
            reason: e.to_string(),
        };

        unsafe {
            let store = device.device.OpenPropertyStore(STGM_READ).map_err(fail)?;
            let value = store.GetValue(&PKEY_Device_FriendlyName).map_err(fail)?;
            let raw = PropVariantToStringAlloc(&value).map_err(fail)?;
            let name = raw.to_string();
            CoTaskMemFree(Some(raw.0 as *const c_void));
            name.map_err(|e| DispatchError::NameLookupFailed {
                reason: e.to_string(),
            })
        }
    }

    fn set_default(&self, device: &WasapiDevice, role: Role) -> Result<(), DispatchError> {
        let endpoint = PCWSTR(device.id.as_ptr());
        unsafe { self.policy.SetDefaultEndpoint(endpoint, endpoint_role(role)) }
            .ok()
            .map_err(|e| DispatchError::SetDefaultFailed {
                // Falls back to the endpoint id when the friendly name is unreadable
                device: self
                    .name_of(device)
                    .unwrap_or_else(|_| device.id.to_string()),
                role,
                reason: e.to_string(),
            })
    }
}
